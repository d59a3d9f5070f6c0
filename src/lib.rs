//! Fill a web form with values chosen by a language model: navigate, read
//! the form's controls, ask a chat-completions endpoint to map a mock-data
//! record onto them, apply each value through simulated UI interactions,
//! and record the session.

pub mod browser;
pub mod config;
pub mod element;
pub mod error;
pub mod fields;
pub mod filler;
pub mod page;
pub mod pipeline;
pub mod recorder;
pub mod resolver;

pub use browser::Browser;
pub use config::{api_key_from_env, BrowserConfig, RunConfig, API_KEY_ENV};
pub use error::{Error, Result};
pub use fields::{extract_fields, ControlType, FieldOption, FormField};
pub use filler::{fill_fields, submit_form, FillReport};
pub use page::Page;
pub use pipeline::{run, RunSummary, Stage};
pub use resolver::{ChatResolver, MockData, ResolvedValues, ValueResolver};
