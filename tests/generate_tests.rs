//! Integration tests for the full `generate` pipeline.

mod common;

use common::{FakeAccount, FakeDirectory, TestContext, write_file};
use std::fs;
use std::sync::Arc;
use termprof::generate::{Generator, InstanceSource};
use termprof::profile::{OutputMode, ReconcileOutcome};
use termprof::sources::ProfileGenerator;
use termprof::GenerateError;
use termprof_config::{Profile, Profiles, UserProfileConfig};

struct Fixed(Vec<Profile>);

impl ProfileGenerator for Fixed {
    fn label(&self) -> &'static str {
        "fixed"
    }

    fn generate(&self) -> Vec<Profile> {
        self.0.clone()
    }
}

fn user_profile(name: &str, command: &str) -> UserProfileConfig {
    UserProfileConfig {
        name: name.to_string(),
        command: Some(command.to_string()),
        ..UserProfileConfig::default()
    }
}

fn generator(ctx: &TestContext) -> Generator {
    Generator::with_sources(ctx.config.clone(), ctx.sources()).cache_path(ctx.cache_path())
}

fn live(directory: FakeDirectory) -> InstanceSource {
    InstanceSource::Live(Arc::new(directory))
}

#[test]
fn test_earlier_source_wins_on_name_clash() {
    let ctx = TestContext::new();
    let sources: Vec<Box<dyn ProfileGenerator>> = vec![
        Box::new(Fixed(vec![Profile::new("x-foo").command("first")])),
        Box::new(Fixed(vec![
            Profile::new("x-foo").command("second"),
            Profile::new("x-bar"),
        ])),
    ];
    let generator = Generator::with_sources(ctx.config.clone(), sources);

    let profiles = generator.assemble(Vec::new()).unwrap();
    assert_eq!(profiles.names(), vec!["x-foo", "x-bar"]);
    assert_eq!(profiles.find_by_name("x-foo").unwrap().command, "first");
}

#[test]
fn test_missing_login_parent_is_fatal() {
    let ctx = TestContext::new();
    ctx.aws_config("[profile dev]\nregion = us-east-1\nsource_profile = missing\n");

    let err = generator(&ctx).assemble(Vec::new()).unwrap_err();
    match err {
        GenerateError::MissingParent { child, parent } => {
            assert_eq!(child, "dev");
            assert_eq!(parent, "login-missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_login_parents_get_children_and_no_triggers() {
    let ctx = TestContext::new();
    ctx.aws_config(
        "[profile root]\nregion = us-east-1\nsso_session = corp\n\n\
         [profile dev]\nregion = eu-west-1\nsource_profile = root\n",
    );

    let profiles = generator(&ctx).assemble(Vec::new()).unwrap();
    let login = profiles.find_by_name("login-root").unwrap();
    assert!(login.triggers.is_empty());
    assert!(login.command.contains("aws sso login"));

    let dev = profiles.find_by_name("dev").unwrap();
    assert!(!dev.triggers.is_empty());
    assert_eq!(dev.smart_selection_rules.len(), 1);
    assert!(profiles.find_by_name("login-dev").is_none());
}

#[test]
fn test_per_profile_trigger_file_is_applied() {
    let mut ctx = TestContext::new();
    ctx.config.profiles.push(user_profile("tools", "htop"));
    write_file(
        &ctx.root().join("triggers").join("tools.json"),
        r#"[{"regex": "^panic", "action": "AlertTrigger", "parameter": "crashed"}]"#,
    );

    let profiles = generator(&ctx).assemble(Vec::new()).unwrap();
    let tools = profiles.find_by_name("tools").unwrap();
    assert!(tools.triggers.iter().any(|t| t.regex == "^panic"));
    let other = profiles.find_by_name("default-profile").unwrap();
    assert!(!other.triggers.iter().any(|t| t.regex == "^panic"));
}

#[tokio::test]
async fn test_write_then_diff_is_empty_until_something_changes() {
    let mut ctx = TestContext::new();
    ctx.config.profiles.push(user_profile("vim", "vim"));

    let mut out = Vec::new();
    let outcome = generator(&ctx)
        .run(OutputMode::Write, InstanceSource::Cached, &mut out)
        .await;
    // No cache yet: cached mode cannot run
    assert!(outcome.is_err());

    let written = generator(&ctx)
        .run(OutputMode::Write, live(FakeDirectory::new()), &mut out)
        .await
        .unwrap();
    assert!(matches!(written, ReconcileOutcome::Written { .. }));
    assert!(out.is_empty());

    let diffed = generator(&ctx)
        .run(OutputMode::Diff, InstanceSource::Cached, &mut out)
        .await
        .unwrap();
    assert_eq!(diffed, ReconcileOutcome::Diffed { entries: Vec::new() });
    assert!(out.is_empty());

    ctx.config.profiles.push(user_profile("htop", "htop"));
    let diffed = generator(&ctx)
        .run(OutputMode::Diff, InstanceSource::Cached, &mut out)
        .await
        .unwrap();
    let ReconcileOutcome::Diffed { entries } = diffed else {
        panic!("expected a diff");
    };
    assert_eq!(entries.len(), 1);
    let report = String::from_utf8(out).unwrap();
    assert!(report.starts_with("Updating (-current +new):\n"));
    assert!(report.contains("+ htop"));
}

#[tokio::test]
async fn test_diff_without_persisted_file_is_fatal() {
    let ctx = TestContext::new();
    let mut out = Vec::new();
    let result = generator(&ctx)
        .run(OutputMode::Diff, live(FakeDirectory::new()), &mut out)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_shell_operators_are_written_literally() {
    let mut ctx = TestContext::new();
    ctx.config
        .profiles
        .push(user_profile("build", "make && make install > /dev/null"));

    let mut out = Vec::new();
    generator(&ctx)
        .run(OutputMode::Write, live(FakeDirectory::new()), &mut out)
        .await
        .unwrap();

    let raw = fs::read_to_string(ctx.output_path()).unwrap();
    assert!(raw.contains("make && make install > /dev/null"));
    assert!(!raw.contains("\\u0026"));
    assert!(raw.starts_with("{\n    \"Profiles\": ["));
}

#[tokio::test]
async fn test_print_mode_leaves_output_untouched() {
    let ctx = TestContext::new();
    let mut out = Vec::new();
    generator(&ctx)
        .run(OutputMode::Print, live(FakeDirectory::new()), &mut out)
        .await
        .unwrap();

    let printed: Profiles = serde_json::from_slice(&out).unwrap();
    assert!(printed.find_by_name("default-profile").is_some());
    assert!(!ctx.output_path().exists());
}

#[tokio::test]
async fn test_live_discovery_is_cached_for_later_runs() {
    let ctx = TestContext::new();
    ctx.aws_config("[profile p1]\nregion = us-east-1\n\n[profile p2]\nregion = us-east-1\n");
    let directory = FakeDirectory::new()
        .scope("p1", FakeAccount::new("111").alias("acme").instance("i-123", "web"))
        .scope("p2", FakeAccount::new("111").alias("acme").instance("i-123", "web"));

    let discovered = generator(&ctx).build(live(directory)).await.unwrap();
    let web = discovered.find_by_name("acme:us-east-1:ssm-web").unwrap();
    // Either scope may win the instance
    let text = web.initial_text.as_deref().unwrap();
    assert!(text == "bash -c 'AWS_PROFILE=p1 ssm web'" || text == "bash -c 'AWS_PROFILE=p2 ssm web'");
    assert!(ctx.cache_path().exists());

    let cached = generator(&ctx).build(InstanceSource::Cached).await.unwrap();
    assert_eq!(cached.names(), discovered.names());
    assert_eq!(
        cached
            .iter()
            .filter(|p| p.name.ends_with(":ssm-web"))
            .count(),
        1
    );
}

#[test]
fn test_conflicting_modes_are_rejected() {
    assert!(matches!(
        OutputMode::from_flags(true, true),
        Err(GenerateError::ConflictingModes)
    ));
}
