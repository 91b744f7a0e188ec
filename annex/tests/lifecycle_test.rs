use annex::{AnnexLifecycle, SetupStep};
use config::AnnexConfig;
use errors::AnnexError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use testing::{AnnexOp, ScriptedAnnexTool, annex_config, init_tracing};

fn lifecycle(tool: &Arc<ScriptedAnnexTool>) -> AnnexLifecycle {
    AnnexLifecycle::new(tool.clone(), &annex_config())
}

#[test]
fn test_setup_runs_all_steps_in_order() {
    init_tracing();
    let tool = Arc::new(ScriptedAnnexTool::new());
    let path = Path::new("/data/repos/alice/myrepo.git");

    let report = lifecycle(&tool).setup(path).unwrap();

    assert!(report.is_complete());
    assert_eq!(
        tool.ops(),
        vec![
            AnnexOp::Init,
            AnnexOp::Upgrade,
            AnnexOp::AddUnlocked,
            AnnexOp::Backend,
            AnnexOp::SizeFilter
        ]
    );

    let calls = tool.calls();
    assert_eq!(calls[0].args, ["annex", "init", "--version=7"]);
    assert_eq!(calls[3].args, ["config", "annex.backends", "MD5"]);
    assert_eq!(
        calls[4].args,
        ["config", "annex.largefiles", "largerthan=10000000"]
    );
    assert!(calls.iter().all(|c| c.path == path));
}

#[test]
fn test_size_filter_follows_config() {
    let tool = Arc::new(ScriptedAnnexTool::new());
    let config = AnnexConfig {
        annex_file_min_size_mb: 50,
        ..Default::default()
    };
    AnnexLifecycle::new(tool.clone(), &config)
        .setup(Path::new("/tmp/r.git"))
        .unwrap();

    let filter = tool
        .calls()
        .into_iter()
        .find(|c| c.op == AnnexOp::SizeFilter)
        .unwrap();
    assert_eq!(filter.args[2], "largerthan=50000000");
}

#[test]
fn test_setup_is_repeatable() {
    let tool = Arc::new(ScriptedAnnexTool::new());
    let lifecycle = lifecycle(&tool);
    let path = Path::new("/data/repos/alice/myrepo.git");

    let first = lifecycle.setup(path).unwrap();
    let second = lifecycle.setup(path).unwrap();

    assert_eq!(first, second);
    assert_eq!(tool.count(AnnexOp::Init), 2);
}

#[test]
fn test_init_failure_aborts_setup() {
    let tool = Arc::new(ScriptedAnnexTool::new().fail_always(AnnexOp::Init));

    let result = lifecycle(&tool).setup(Path::new("/data/repos/a.git"));

    assert!(matches!(
        result,
        Err(AnnexError::InitFailed { ref path, .. }) if path == "/data/repos/a.git"
    ));
    assert_eq!(tool.ops(), vec![AnnexOp::Init]);
}

#[test]
fn test_later_step_failures_are_reported_not_fatal() {
    let tool = Arc::new(
        ScriptedAnnexTool::new()
            .fail_always(AnnexOp::Upgrade)
            .fail_always(AnnexOp::Backend)
    );

    let report = lifecycle(&tool).setup(Path::new("/data/repos/a.git")).unwrap();

    assert_eq!(tool.ops().len(), 5);
    assert_eq!(
        report.completed,
        vec![SetupStep::Init, SetupStep::AddUnlocked, SetupStep::SizeFilter]
    );
    let failed: Vec<SetupStep> = report.failures.iter().map(|f| f.step).collect();
    assert_eq!(failed, vec![SetupStep::Upgrade, SetupStep::Backend]);
    assert_eq!(report.errors().len(), 2);
}

#[test]
fn test_sync_succeeds_first_time() {
    let tool = Arc::new(ScriptedAnnexTool::new());
    lifecycle(&tool).sync(Path::new("/data/repos/a.git")).unwrap();

    assert_eq!(tool.count(AnnexOp::Sync), 1);
    assert_eq!(tool.calls()[0].args, ["annex", "sync", "--content"]);
}

#[test]
fn test_sync_retries_once_after_failure() {
    let tool = Arc::new(ScriptedAnnexTool::new().fail(AnnexOp::Sync, 1));
    lifecycle(&tool).sync(Path::new("/data/repos/a.git")).unwrap();

    assert_eq!(tool.count(AnnexOp::Sync), 2);
}

#[test]
fn test_sync_never_runs_a_third_time() {
    let tool = Arc::new(ScriptedAnnexTool::new().fail_always(AnnexOp::Sync));
    let result = lifecycle(&tool).sync(Path::new("/data/repos/a.git"));

    assert_eq!(tool.count(AnnexOp::Sync), 2);
    let err = result.unwrap_err();
    assert!(matches!(err, AnnexError::SyncFailed { .. }));
    assert_eq!(
        err.to_string(),
        "git annex sync --content [/data/repos/a.git]"
    );
}

#[test]
fn test_clean_teardown_leaves_permissions_alone() {
    let dir = tempfile::tempdir().unwrap();
    let tool = Arc::new(ScriptedAnnexTool::new());

    let report = lifecycle(&tool).teardown(dir.path());

    assert!(report.is_clean());
    assert!(report.remediation.is_none());
    assert_eq!(tool.ops(), vec![AnnexOp::Uninit]);
}

#[cfg(unix)]
#[test]
fn test_failed_uninit_makes_tree_writable() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let objects = dir.path().join("annex/objects/Xk/9f");
    fs::create_dir_all(&objects).unwrap();
    let content = objects.join("MD5-s1024--d41d8cd98f00b204e9800998ecf8427e");
    fs::write(&content, vec![0u8; 1024]).unwrap();
    fs::write(dir.path().join("config"), b"[core]\n").unwrap();
    fs::set_permissions(&content, fs::Permissions::from_mode(0o444)).unwrap();
    fs::set_permissions(&objects, fs::Permissions::from_mode(0o555)).unwrap();

    let tool = Arc::new(ScriptedAnnexTool::new().fail_always(AnnexOp::Uninit));
    let report = lifecycle(&tool).teardown(dir.path());

    assert!(!report.is_clean());
    let remediation = report.remediation.unwrap();
    assert_eq!(remediation.files, 2);
    assert!(remediation.failures.is_empty());

    let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&content), 0o660);
    assert_eq!(mode(&objects), 0o770);
    assert_eq!(mode(&dir.path().join("config")), 0o660);

    // The repository can now be deleted.
    fs::remove_dir_all(dir.path().join("annex")).unwrap();
}

#[test]
fn test_teardown_of_missing_repository_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let tool = Arc::new(ScriptedAnnexTool::new().fail_always(AnnexOp::Uninit));

    let report = lifecycle(&tool).teardown(&dir.path().join("missing.git"));

    let remediation = report.remediation.unwrap();
    assert_eq!(remediation.failures.len(), 1);
}
