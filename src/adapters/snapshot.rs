use crate::core::hierarchy::root_lus_from_links;
use crate::domain::model::{
    Cohort, CohortId, CohortTraining, Course, CourseId, Granularity, LearningUnit, Link, LuId,
    OutsideCourse, SortOrder, Training, TrainingId, TrainingLink,
};
use crate::domain::ports::{LinkStore, Storage};
use crate::utils::error::{ArchitectureError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

pub const TRAININGS_FILE: &str = "trainings.csv";
pub const LEARNING_UNITS_FILE: &str = "learning_units.csv";
pub const LINKS_FILE: &str = "lu_to_lu.csv";
pub const ORDER_FILE: &str = "order.csv";
pub const TRAINING_LINKS_FILE: &str = "training_links.csv";
pub const COURSES_FILE: &str = "courses.csv";
pub const COHORTS_FILE: &str = "cohorts.csv";
pub const COHORT_TRAININGS_FILE: &str = "cohort_to_training.csv";
pub const OUTSIDE_COURSES_FILE: &str = "courses_not_architecture.csv";

/// Raw tables of a training architecture export.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub trainings: Vec<Training>,
    pub learning_units: Vec<LearningUnit>,
    pub links: Vec<Link>,
    pub sort_orders: Vec<SortOrder>,
    pub training_links: Vec<TrainingLink>,
    pub courses: Vec<Course>,
    pub cohorts: Vec<Cohort>,
    pub cohort_trainings: Vec<CohortTraining>,
    pub outside_courses: Vec<OutsideCourse>,
}

impl Snapshot {
    pub fn training(mut self, id: TrainingId, name: &str, levels: i64, is_semester: bool) -> Self {
        self.trainings.push(Training {
            id,
            fullname: name.to_string(),
            shortname: name.to_string(),
            description: None,
            granularity: Granularity::from_level(levels),
            is_semester,
        });
        self
    }

    pub fn lu(mut self, id: LuId, name: &str) -> Self {
        self.learning_units.push(LearningUnit {
            id,
            fullname: name.to_string(),
            shortname: name.to_string(),
            description: None,
        });
        self
    }

    pub fn course(mut self, id: CourseId, shortname: &str) -> Self {
        self.courses.push(Course {
            id,
            shortname: shortname.to_string(),
            summary: String::new(),
            image_url: None,
        });
        self
    }

    pub fn lu_link(mut self, training_id: TrainingId, parent: LuId, child: LuId) -> Self {
        self.links.push(Link {
            training_id,
            parent_lu_id: parent,
            child_id: child,
            child_is_course: false,
        });
        self
    }

    pub fn course_link(mut self, training_id: TrainingId, parent: LuId, course: CourseId) -> Self {
        self.links.push(Link {
            training_id,
            parent_lu_id: parent,
            child_id: course,
            child_is_course: true,
        });
        self
    }

    pub fn sort_order(mut self, training_id: TrainingId, lu_id: LuId, sort_order: i64) -> Self {
        self.sort_orders.push(SortOrder {
            training_id,
            lu_id,
            sort_order,
        });
        self
    }

    pub fn semester(mut self, training_id: TrainingId, course_id: CourseId, semester: u32) -> Self {
        self.training_links.push(TrainingLink {
            training_id,
            course_id,
            semester: Some(semester),
        });
        self
    }

    pub fn cohort(mut self, id: CohortId, name: &str, trainings: &[TrainingId]) -> Self {
        self.cohorts.push(Cohort {
            id,
            name: name.to_string(),
        });
        self.cohort_trainings
            .extend(trainings.iter().map(|&training_id| CohortTraining {
                cohort_id: id,
                training_id,
            }));
        self
    }

    pub fn outside_course(mut self, training_id: TrainingId, course_id: CourseId) -> Self {
        self.outside_courses.push(OutsideCourse {
            training_id,
            course_id,
        });
        self
    }
}

/// In-memory `LinkStore` over a `Snapshot`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: Snapshot,
    trainings: HashMap<TrainingId, Training>,
    links_by_parent: HashMap<(TrainingId, LuId), Vec<Link>>,
    sort_orders: HashMap<(TrainingId, LuId), i64>,
    learning_units: HashMap<LuId, LearningUnit>,
    courses: HashMap<CourseId, Course>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let trainings = snapshot
            .trainings
            .iter()
            .map(|t| (t.id, t.clone()))
            .collect();

        let mut links_by_parent: HashMap<(TrainingId, LuId), Vec<Link>> = HashMap::new();
        for link in &snapshot.links {
            links_by_parent
                .entry((link.training_id, link.parent_lu_id))
                .or_default()
                .push(*link);
        }

        // 重複的排序紀錄以第一筆為準
        let mut sort_orders = HashMap::new();
        for order in &snapshot.sort_orders {
            sort_orders
                .entry((order.training_id, order.lu_id))
                .or_insert(order.sort_order);
        }

        let learning_units = snapshot
            .learning_units
            .iter()
            .map(|lu| (lu.id, lu.clone()))
            .collect();
        let courses = snapshot
            .courses
            .iter()
            .map(|c| (c.id, c.clone()))
            .collect();

        Self {
            snapshot,
            trainings,
            links_by_parent,
            sort_orders,
            learning_units,
            courses,
        }
    }

    /// Loads the CSV tables from `storage`. Cohort and outside-course tables are optional.
    pub async fn load<S: Storage>(storage: &S) -> Result<Self> {
        let trainings: Vec<TrainingRow> = read_table(storage, TRAININGS_FILE).await?;
        let learning_units: Vec<LearningUnitRow> =
            read_table(storage, LEARNING_UNITS_FILE).await?;
        let links: Vec<LinkRow> = read_table(storage, LINKS_FILE).await?;
        let sort_orders: Vec<SortOrderRow> = read_table(storage, ORDER_FILE).await?;
        let training_links: Vec<TrainingLinkRow> =
            read_table(storage, TRAINING_LINKS_FILE).await?;
        let courses: Vec<CourseRow> = read_table(storage, COURSES_FILE).await?;
        let cohorts: Vec<CohortRow> = read_optional_table(storage, COHORTS_FILE).await?;
        let cohort_trainings: Vec<CohortTrainingRow> =
            read_optional_table(storage, COHORT_TRAININGS_FILE).await?;
        let outside_courses: Vec<OutsideCourseRow> =
            read_optional_table(storage, OUTSIDE_COURSES_FILE).await?;

        let snapshot = Snapshot {
            trainings: trainings.into_iter().map(Into::into).collect(),
            learning_units: learning_units.into_iter().map(Into::into).collect(),
            links: links.into_iter().map(Into::into).collect(),
            sort_orders: sort_orders.into_iter().map(Into::into).collect(),
            training_links: training_links.into_iter().map(Into::into).collect(),
            courses: courses.into_iter().map(Into::into).collect(),
            cohorts: cohorts.into_iter().map(Into::into).collect(),
            cohort_trainings: cohort_trainings.into_iter().map(Into::into).collect(),
            outside_courses: outside_courses.into_iter().map(Into::into).collect(),
        };

        tracing::debug!(
            "Loaded snapshot: {} trainings, {} LUs, {} links, {} courses",
            snapshot.trainings.len(),
            snapshot.learning_units.len(),
            snapshot.links.len(),
            snapshot.courses.len()
        );

        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl LinkStore for SnapshotStore {
    fn trainings(&self, ids: &[TrainingId]) -> Result<Vec<Training>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.trainings.get(id).cloned())
            .collect())
    }

    fn root_lus(&self, training_id: TrainingId, granularity: Granularity) -> Result<Vec<LuId>> {
        let links: Vec<Link> = self.all_links(training_id)?;
        Ok(root_lus_from_links(&links, granularity))
    }

    fn child_links(&self, training_id: TrainingId, parent_lu_id: LuId) -> Result<Vec<Link>> {
        Ok(self
            .links_by_parent
            .get(&(training_id, parent_lu_id))
            .cloned()
            .unwrap_or_default())
    }

    fn has_child_links(&self, training_id: TrainingId, lu_id: LuId) -> Result<bool> {
        Ok(self.links_by_parent.contains_key(&(training_id, lu_id)))
    }

    fn parent_links(
        &self,
        training_id: TrainingId,
        child_id: i64,
        child_is_course: bool,
    ) -> Result<Vec<Link>> {
        Ok(self
            .snapshot
            .links
            .iter()
            .filter(|l| {
                l.training_id == training_id
                    && l.child_id == child_id
                    && l.child_is_course == child_is_course
            })
            .copied()
            .collect())
    }

    fn sort_order(&self, training_id: TrainingId, lu_id: LuId) -> Result<Option<i64>> {
        Ok(self.sort_orders.get(&(training_id, lu_id)).copied())
    }

    fn all_links(&self, training_id: TrainingId) -> Result<Vec<Link>> {
        Ok(self
            .snapshot
            .links
            .iter()
            .filter(|l| l.training_id == training_id)
            .copied()
            .collect())
    }

    fn training_links(&self, training_id: TrainingId) -> Result<Vec<TrainingLink>> {
        Ok(self
            .snapshot
            .training_links
            .iter()
            .filter(|l| l.training_id == training_id)
            .copied()
            .collect())
    }

    fn lu_metadata(&self, ids: &[LuId]) -> Result<HashMap<LuId, LearningUnit>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.learning_units.get(id).map(|lu| (*id, lu.clone())))
            .collect())
    }

    fn course_metadata(&self, ids: &[CourseId]) -> Result<HashMap<CourseId, Course>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.courses.get(id).map(|c| (*id, c.clone())))
            .collect())
    }

    fn cohorts(&self, ids: &[CohortId]) -> Result<Vec<Cohort>> {
        Ok(self
            .snapshot
            .cohorts
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    fn cohort_trainings(&self, cohort_ids: &[CohortId]) -> Result<Vec<CohortTraining>> {
        Ok(self
            .snapshot
            .cohort_trainings
            .iter()
            .filter(|ct| cohort_ids.contains(&ct.cohort_id))
            .copied()
            .collect())
    }

    fn courses_not_in_architecture(&self, training_ids: &[TrainingId]) -> Result<Vec<CourseId>> {
        Ok(self
            .snapshot
            .outside_courses
            .iter()
            .filter(|o| training_ids.contains(&o.training_id))
            .map(|o| o.course_id)
            .collect())
    }
}

async fn read_table<S: Storage, T: DeserializeOwned>(storage: &S, file: &str) -> Result<Vec<T>> {
    let data = storage.read_file(file).await?;
    parse_table(file, &data)
}

async fn read_optional_table<S: Storage, T: DeserializeOwned>(
    storage: &S,
    file: &str,
) -> Result<Vec<T>> {
    if !storage.exists(file).await {
        tracing::debug!("Optional table {} not found, using an empty table", file);
        return Ok(Vec::new());
    }
    read_table(storage, file).await
}

pub fn parse_table<T: DeserializeOwned>(file: &str, data: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: T = row.map_err(|e| {
            tracing::error!("Failed to parse {}: {}", file, e);
            ArchitectureError::CsvError(e)
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected true/false/1/0, got '{}'",
            other
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct TrainingRow {
    id: TrainingId,
    fullname: String,
    shortname: String,
    description: Option<String>,
    granularitylevel: i64,
    #[serde(deserialize_with = "flag")]
    issemester: bool,
}

impl From<TrainingRow> for Training {
    fn from(row: TrainingRow) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            shortname: row.shortname,
            description: non_empty(row.description),
            granularity: Granularity::from_level(row.granularitylevel),
            is_semester: row.issemester,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LearningUnitRow {
    id: LuId,
    fullname: String,
    shortname: String,
    description: Option<String>,
}

impl From<LearningUnitRow> for LearningUnit {
    fn from(row: LearningUnitRow) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            shortname: row.shortname,
            description: non_empty(row.description),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    trainingid: TrainingId,
    luid1: LuId,
    luid2: i64,
    #[serde(deserialize_with = "flag")]
    isluid2course: bool,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Self {
            training_id: row.trainingid,
            parent_lu_id: row.luid1,
            child_id: row.luid2,
            child_is_course: row.isluid2course,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SortOrderRow {
    trainingid: TrainingId,
    luid: LuId,
    sortorder: i64,
}

impl From<SortOrderRow> for SortOrder {
    fn from(row: SortOrderRow) -> Self {
        Self {
            training_id: row.trainingid,
            lu_id: row.luid,
            sort_order: row.sortorder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrainingLinkRow {
    trainingid: TrainingId,
    courseid: CourseId,
    semester: Option<u32>,
}

impl From<TrainingLinkRow> for TrainingLink {
    fn from(row: TrainingLinkRow) -> Self {
        Self {
            training_id: row.trainingid,
            course_id: row.courseid,
            // 學期 0 視為未指定
            semester: row.semester.filter(|s| *s > 0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CourseRow {
    id: CourseId,
    shortname: String,
    summary: Option<String>,
    image: Option<String>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id,
            shortname: row.shortname,
            summary: row.summary.unwrap_or_default(),
            image_url: non_empty(row.image),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CohortRow {
    id: CohortId,
    name: String,
}

impl From<CohortRow> for Cohort {
    fn from(row: CohortRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CohortTrainingRow {
    cohortid: CohortId,
    trainingid: TrainingId,
}

impl From<CohortTrainingRow> for CohortTraining {
    fn from(row: CohortTrainingRow) -> Self {
        Self {
            cohort_id: row.cohortid,
            training_id: row.trainingid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutsideCourseRow {
    trainingid: TrainingId,
    courseid: CourseId,
}

impl From<OutsideCourseRow> for OutsideCourse {
    fn from(row: OutsideCourseRow) -> Self {
        Self {
            training_id: row.trainingid,
            course_id: row.courseid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_links_with_mixed_flags() {
        let csv = "trainingid,luid1,luid2,isluid2course\n1,10,20,false\n1,20,100,true\n1,20,101,1\n";
        let rows: Vec<LinkRow> = parse_table(LINKS_FILE, csv.as_bytes()).unwrap();
        let links: Vec<Link> = rows.into_iter().map(Into::into).collect();

        assert_eq!(links.len(), 3);
        assert!(!links[0].child_is_course);
        assert!(links[1].child_is_course);
        assert!(links[2].child_is_course);
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        let csv = "trainingid,luid1,luid2,isluid2course\n1,10,20,maybe\n";
        let result: Result<Vec<LinkRow>> = parse_table(LINKS_FILE, csv.as_bytes());
        assert!(matches!(result, Err(ArchitectureError::CsvError(_))));
    }

    #[test]
    fn test_semester_zero_is_unassigned() {
        let csv = "trainingid,courseid,semester\n1,100,0\n1,101,\n1,102,3\n";
        let rows: Vec<TrainingLinkRow> = parse_table(TRAINING_LINKS_FILE, csv.as_bytes()).unwrap();
        let links: Vec<TrainingLink> = rows.into_iter().map(Into::into).collect();

        assert_eq!(links[0].semester, None);
        assert_eq!(links[1].semester, None);
        assert_eq!(links[2].semester, Some(3));
    }

    #[test]
    fn test_store_queries_are_scoped_to_training() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .lu_link(1, 10, 20)
                .course_link(1, 20, 100)
                .course_link(2, 20, 200)
                .sort_order(1, 20, 4)
                .sort_order(1, 20, 9),
        );

        assert_eq!(store.child_links(1, 20).unwrap().len(), 1);
        assert_eq!(store.child_links(2, 20).unwrap()[0].child_id, 200);
        assert!(store.has_child_links(1, 10).unwrap());
        assert!(!store.has_child_links(2, 10).unwrap());
        assert_eq!(store.parent_links(1, 20, false).unwrap()[0].parent_lu_id, 10);
        assert_eq!(store.sort_order(1, 20).unwrap(), Some(4));
        assert_eq!(store.sort_order(2, 20).unwrap(), None);
        assert_eq!(store.all_links(1).unwrap().len(), 2);
    }
}
