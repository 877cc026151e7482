mod services;

pub use services::{Assignment, AssignmentRegistry};
