pub mod builder;
pub mod input;
pub mod intent;

pub use builder::PlanBuilder;
pub use input::{
    is_valid_email, AdminInput, ClientInput, FieldIssue, LoanInput, RegistrationInput, WorkerInput,
};
pub use intent::{ClientIntent, IntentTree, LoanIntent, WorkerIntent};
