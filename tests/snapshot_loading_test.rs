use std::path::Path;
use tempfile::TempDir;
use training_architecture::domain::model::{DisplayContext, Granularity};
use training_architecture::domain::ports::{LinkStore, Presenter};
use training_architecture::{
    ArchitectureBuilder, ArchitectureError, LocalStorage, SnapshotStore, TextPresenter,
    TomlConfig, UserRequest,
};

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn write_required_tables(dir: &Path) {
    write(
        dir,
        "trainings.csv",
        "id,fullname,shortname,description,granularitylevel,issemester\n\
         1,Bachelor of Nursing,BN,First cycle,2,1\n\
         2,Short course,SC,,1,false\n",
    );
    write(
        dir,
        "learning_units.csv",
        "id,fullname,shortname,description\n\
         1,Foundations block,FND,\n\
         10,Human anatomy,ANAT,Bones and muscles\n\
         20,First aid,AID,\n",
    );
    write(
        dir,
        "lu_to_lu.csv",
        "trainingid,luid1,luid2,isluid2course\n\
         1,1,10,0\n\
         1,10,100,1\n\
         1,10,101,true\n\
         2,20,102,1\n",
    );
    write(dir, "order.csv", "trainingid,luid,sortorder\n1,10,1\n");
    write(
        dir,
        "training_links.csv",
        "trainingid,courseid,semester\n1,100,1\n1,101,0\n",
    );
    write(
        dir,
        "courses.csv",
        "id,shortname,summary,image\n\
         100,ANAT1,<p>Intro to <b>anatomy</b></p>,\n\
         101,ANAT2,,https://cdn.example.com/anat2.png\n\
         102,AID1,,\n\
         900,FREE,,\n",
    );
}

#[tokio::test]
async fn test_load_snapshot_from_csv_directory() {
    let temp_dir = TempDir::new().unwrap();
    write_required_tables(temp_dir.path());
    write(temp_dir.path(), "cohorts.csv", "id,name\n7,Promo 2024\n");
    write(
        temp_dir.path(),
        "cohort_to_training.csv",
        "cohortid,trainingid\n7,1\n7,2\n",
    );
    write(
        temp_dir.path(),
        "courses_not_architecture.csv",
        "trainingid,courseid\n1,900\n2,900\n",
    );

    let storage = LocalStorage::new(temp_dir.path());
    let store = SnapshotStore::load(&storage).await.unwrap();

    let nursing = store.training(1).unwrap().unwrap();
    assert_eq!(nursing.granularity, Granularity::TwoLevel);
    assert!(nursing.is_semester);
    assert_eq!(nursing.description.as_deref(), Some("First cycle"));
    let short = store.training(2).unwrap().unwrap();
    assert_eq!(short.granularity, Granularity::OneLevel);
    assert!(short.description.is_none());

    assert_eq!(store.snapshot().links.len(), 4);
    assert_eq!(store.root_lus(1, nursing.granularity).unwrap(), vec![1]);
    assert_eq!(store.sort_order(1, 10).unwrap(), Some(1));
    assert_eq!(store.sort_order(1, 1).unwrap(), None);
    // semester 0 means unassigned
    assert_eq!(store.training_links(1).unwrap()[1].semester, None);
    assert_eq!(store.courses_not_in_architecture(&[1, 2]).unwrap(), vec![900, 900]);

    let config = TomlConfig::default();
    let ctx = config.render_context(DisplayContext::Dashboard, None);
    let presenter = TextPresenter::new(config.labels());
    let page = ArchitectureBuilder::new(&store, &presenter, &ctx)
        .build_page(&UserRequest {
            cohort_ids: vec![7],
            enrolled_course_ids: vec![100],
            is_editing: false,
        })
        .unwrap();

    assert_eq!(page.trainings.len(), 2);
    assert_eq!(page.outside_courses.len(), 1);
    let nursing_section = page.trainings[0].section().unwrap();
    assert_eq!(nursing_section.title, "Bachelor of Nursing");
    assert_eq!(nursing_section.semesters.len(), 1);
    let anatomy = &nursing_section.trees[0].children[0];
    assert_eq!(anatomy.name, "Human anatomy");
    assert_eq!(anatomy.courses[0].summary, "Intro to anatomy");
    assert_eq!(anatomy.courses[1].image_url, "https://cdn.example.com/anat2.png");
    assert!(anatomy.courses[0]
        .image_url
        .ends_with("/blocks/training_architecture/images/no_image.jpg"));

    let text = presenter.render_page(&page).unwrap();
    assert!(text.contains("Courses outside the architecture"));
    assert!(text.contains("Training: Short course (Promo 2024)"));
}

#[tokio::test]
async fn test_optional_tables_may_be_missing() {
    let temp_dir = TempDir::new().unwrap();
    write_required_tables(temp_dir.path());

    let storage = LocalStorage::new(temp_dir.path());
    let store = SnapshotStore::load(&storage).await.unwrap();

    assert!(store.cohorts(&[7]).unwrap().is_empty());
    assert!(store.courses_not_in_architecture(&[1]).unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_required_table_fails() {
    let temp_dir = TempDir::new().unwrap();
    write_required_tables(temp_dir.path());
    std::fs::remove_file(temp_dir.path().join("lu_to_lu.csv")).unwrap();

    let storage = LocalStorage::new(temp_dir.path());
    let err = SnapshotStore::load(&storage).await.unwrap_err();
    assert!(matches!(err, ArchitectureError::IoError(_)));
}

#[tokio::test]
async fn test_malformed_flag_is_a_csv_error() {
    let temp_dir = TempDir::new().unwrap();
    write_required_tables(temp_dir.path());
    write(
        temp_dir.path(),
        "lu_to_lu.csv",
        "trainingid,luid1,luid2,isluid2course\n1,1,10,maybe\n",
    );

    let storage = LocalStorage::new(temp_dir.path());
    let err = SnapshotStore::load(&storage).await.unwrap_err();
    assert!(matches!(err, ArchitectureError::CsvError(_)));
    assert_eq!(
        err.category(),
        training_architecture::utils::error::ErrorCategory::DataSource
    );
}
