//! Profile model and configuration for termprof.
//!
//! This crate provides:
//!
//! - The profile record and collection types written to the dynamic
//!   profiles document
//! - Trigger, keyboard map and smart-selection types
//! - The termprof config file and its defaults
//! - A reader for the AWS CLI INI files

pub mod automation;
pub mod aws_config;
pub mod config;
pub mod defaults;
pub mod error;
pub mod profile_types;

pub use automation::{
    KeyboardAction, SelectionPrecision, SmartSelectionAction, SmartSelectionRule, Trigger,
    TriggerAction,
};
pub use aws_config::{AwsSection, merge_sections, parse_aws_ini_str, read_aws_ini};
pub use config::{Config, UserProfileConfig, expand_tilde, substitute_variables};
pub use error::ConfigError;
pub use profile_types::{Profile, ProfileGuid, ProfileOrigin, Profiles};
