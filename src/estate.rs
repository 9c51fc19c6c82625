//! Shell script that runs one command in every AWS account.
//!
//! For each login parent, its login command comes first (without the
//! retry-on-failure sleep), then the command once per dependent profile
//! with `AWS_PROFILE` set. Placeholders:
//!
//! - `{{ .Profile }}`: the dependent AWS profile
//! - `{{ .Region }}`: expands the command into one line per region

use crate::error::GenerateError;
use crate::profile::derive_hierarchy;
use termprof_config::{Profile, ProfileOrigin, Profiles};

pub const PROFILE_PLACEHOLDER: &str = "{{ .Profile }}";
pub const REGION_PLACEHOLDER: &str = "{{ .Region }}";

/// Regions a `{{ .Region }}` command is expanded over.
pub const REGIONS: &[&str] = &[
    "us-east-2",
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-northeast-3",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ca-central-1",
    "cn-north-1",
    "cn-northwest-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-south-1",
    "eu-west-3",
    "eu-north-1",
    "me-south-1",
    "sa-east-1",
];

const RETRY_SUFFIX: &str = " || sleep 60'";

fn aws_profile_name(profile: &Profile) -> &str {
    match profile.origin {
        ProfileOrigin::AwsAccount {
            ref aws_profile, ..
        } => aws_profile,
        _ => &profile.name,
    }
}

/// Expand the placeholders of `command` for one profile.
pub fn render_command(command: &str, aws_profile: &str) -> Vec<String> {
    let template = format!("AWS_PROFILE={PROFILE_PLACEHOLDER} {command}");
    let template = template.replace(PROFILE_PLACEHOLDER, aws_profile);
    if template.contains(REGION_PLACEHOLDER) {
        REGIONS
            .iter()
            .map(|region| template.replace(REGION_PLACEHOLDER, region))
            .collect()
    } else {
        vec![template]
    }
}

/// Script lines running `command` across every dependent AWS profile.
pub fn generate_commands(profiles: &Profiles, command: &str) -> Result<Vec<String>, GenerateError> {
    let hierarchy = derive_hierarchy(profiles)?;
    let mut lines = Vec::new();

    for (label, group) in hierarchy.iter() {
        crate::debug_log!(
            "ESTATE",
            "{}: {} dependent profiles",
            label,
            group.children.len()
        );
        lines.push(group.parent.command.replace(RETRY_SUFFIX, "'"));
        for child in &group.children {
            lines.extend(render_command(command, aws_profile_name(child)));
        }
    }
    Ok(lines)
}
