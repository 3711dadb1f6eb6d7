pub mod architecture;
pub mod courses;
pub mod hierarchy;
pub mod membership;
pub mod ordering;
pub mod path;
pub mod semester;

pub use crate::domain::model::{Granularity, Link, RenderContext, Training};
pub use crate::domain::ports::{LinkStore, Presenter, Storage};
pub use crate::utils::error::Result;
