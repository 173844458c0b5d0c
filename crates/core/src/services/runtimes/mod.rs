pub mod script;

pub use script::{RuntimeProbe, ScriptRuntime, INTERPRETER_ENV};
