//! Automation types attached to profiles: triggers, keyboard map entries and
//! smart-selection rules.
//!
//! Field names follow the iTerm2 dynamic profile schema so the structs can be
//! serialized straight into the output document.

use serde::{Deserialize, Serialize};

/// Action fired when a trigger's regex matches a line of output.
///
/// Serialized as the iTerm2 trigger class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerAction {
    /// Inject the trigger parameter as typed text.
    #[serde(rename = "SendTextTrigger")]
    SendText,
    /// Open the password manager on the entry named by the parameter.
    #[serde(rename = "PasswordTrigger")]
    Password,
    /// Run the parameter as a command outside the session.
    #[serde(rename = "ScriptTrigger")]
    RunCommand,
    /// Highlight the matched text.
    #[serde(rename = "HighlightTrigger")]
    Highlight,
    /// Show an alert with the parameter as message.
    #[serde(rename = "AlertTrigger")]
    Alert,
}

impl TriggerAction {
    /// Returns true if this action types into or executes on the user's behalf.
    ///
    /// Dangerous actions: `SendText`, `RunCommand`
    pub fn is_dangerous(self) -> bool {
        matches!(self, Self::SendText | Self::RunCommand)
    }

    /// Human-readable display name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::SendText => "Send Text",
            Self::Password => "Open Password Manager",
            Self::RunCommand => "Run Command",
            Self::Highlight => "Highlight",
            Self::Alert => "Alert",
        }
    }
}

/// A pattern-matching automation rule evaluated against profile output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Regular expression matched against each output line.
    pub regex: String,
    pub action: TriggerAction,
    /// Text or command handed to the action.
    #[serde(default)]
    pub parameter: String,
    /// Allow the trigger to fire before the line terminator arrives.
    #[serde(default)]
    pub partial: bool,
}

impl Trigger {
    pub fn new(regex: impl Into<String>, action: TriggerAction, parameter: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            action,
            parameter: parameter.into(),
            partial: false,
        }
    }

    /// Mark the trigger as firing on partial lines.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    /// Check that the regex compiles.
    pub fn validate(&self) -> Result<(), regex::Error> {
        regex::Regex::new(&self.regex).map(|_| ())
    }

    /// Two triggers collide when they react to the same pattern the same way.
    pub fn collides_with(&self, other: &Trigger) -> bool {
        self.regex == other.regex && self.action == other.action
    }
}

/// iTerm2 keyboard-map action codes used by the generator.
pub mod key_action {
    /// Send the `Text` field as typed input.
    pub const SEND_TEXT: u32 = 12;
}

/// A keyboard map entry: chord identifier → action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardAction {
    #[serde(rename = "Action")]
    pub action: u32,
    #[serde(rename = "Text", default)]
    pub text: String,
}

impl KeyboardAction {
    pub fn send_text(text: impl Into<String>) -> Self {
        Self {
            action: key_action::SEND_TEXT,
            text: text.into(),
        }
    }
}

/// Precision class of a smart-selection rule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPrecision {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

/// iTerm2 context-menu action codes for smart-selection actions.
pub mod selection_action {
    pub const OPEN_URL: u32 = 1;
    pub const RUN_COMMAND: u32 = 2;
    pub const SEND_TEXT: u32 = 4;
}

/// Context-menu action offered on a smart selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartSelectionAction {
    pub title: String,
    pub action: u32,
    /// `\0` is replaced by the selected text.
    pub parameter: String,
}

/// A smart-selection rule: regex + the actions offered on a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartSelectionRule {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub precision: SelectionPrecision,
    pub regex: String,
    #[serde(default)]
    pub actions: Vec<SmartSelectionAction>,
}
