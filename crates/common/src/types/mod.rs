mod answer;
mod case;
mod diagnosis;
mod hypothesis;
mod question;

pub use answer::*;
pub use case::*;
pub use diagnosis::*;
pub use hypothesis::*;
pub use question::*;
