//! Timetabling domain models.
//!
//! Provides the data types a generation run consumes and produces.
//!
//! # Domain Mappings
//!
//! | u-timetable | School |
//! |-------------|--------|
//! | CourseGroup | Class / timetable column |
//! | TeachingAssignment | Teacher × subject × group weekly hours |
//! | ReliefAllotment | Teacher workload reduction hours |
//! | Session | One weekly hour to place |
//! | RestrictionPool | Remaining legal (day, slot) options of a session |
//! | ScheduleMatrix | Candidate weekly timetable |

mod assignment;
mod group;
mod input;
mod matrix;
mod restriction;
mod session;
mod teacher;

pub use assignment::{FixedPin, ReliefAllotment, TeachingAssignment};
pub use group::{CourseGroup, EducationLevel, Shift};
pub use input::{TimetableInput, WeekLayout};
pub use matrix::{Cell, DayProfile, Grid, Placement, ScheduleMatrix};
pub use restriction::{Narrowing, RestrictionItem, RestrictionPool, SlotExhausted, DAYS_PER_WEEK};
pub use session::{CouplingKey, Session, SessionKind};
pub use teacher::{AvoidSlot, Teacher, TeacherPreferences};
