use std::fs;
use std::time::{Duration, SystemTime};

use aep_config::Settings;
use tempfile::TempDir;

use super::*;
use crate::fake_port::FakePort;

struct Fixture {
    temp: TempDir,
    port: Arc<FakePort>,
    store: Arc<CapabilityStore>,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("workspace")).unwrap();
        let port = Arc::new(FakePort::default());
        let store = CapabilityStore::with_port(
            temp.path().join("store"),
            port.clone(),
            &Settings::default(),
        )
        .unwrap();
        Self {
            temp,
            port,
            store: Arc::new(store),
        }
    }

    fn workspace(&self) -> PathBuf {
        self.temp.path().join("workspace")
    }

    fn session(&self) -> Session {
        Session::new(self.store.clone(), self.workspace())
    }

    async fn add_tool(&self, name: &str, source: &str) {
        let path = self.temp.path().join(format!("{}.py", name));
        fs::write(&path, source).unwrap();
        self.store.tools().add(&path, None, &[]).await.unwrap();
    }

    async fn add_skill(&self, name: &str, scripts: &[(&str, &str)]) {
        let dir = self.temp.path().join("sources").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {}\ndescription: Demo skill\n---\n# {}\n", name, name),
        )
        .unwrap();
        for (file, content) in scripts {
            fs::write(dir.join(file), content).unwrap();
        }
        self.store.skills().add(&dir, None, None).await.unwrap();
    }
}

#[tokio::test]
async fn test_empty_command() {
    let fx = Fixture::new();
    assert_eq!(fx.session().exec("  ").await, ExecOutcome::default());
}

#[tokio::test]
async fn test_tools_list_in_registration_order() {
    let fx = Fixture::new();
    fx.add_tool("zeta", "def run():\n    pass\n").await;
    // Registered well before alpha, whatever the filesystem's mtime granularity.
    let zeta = fx.store.layout().tool_path("zeta");
    fs::File::options()
        .write(true)
        .open(&zeta)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(60))
        .unwrap();
    fx.add_tool("alpha", "\"\"\"Alpha tool.\"\"\"\n").await;

    let outcome = fx.session().exec("tools list").await;

    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.stdout, "zeta\nalpha\n");
}

#[tokio::test]
async fn test_tools_list_empty() {
    let fx = Fixture::new();
    let outcome = fx.session().exec("tools list").await;
    assert_eq!(outcome, ExecOutcome::default());
}

#[tokio::test]
async fn test_tools_info() {
    let fx = Fixture::new();
    fx.add_tool("alpha", "\"\"\"Alpha tool.\"\"\"\n").await;
    let mut session = fx.session();

    let outcome = session.exec("tools info alpha").await;
    assert_eq!(outcome.status, 0);
    assert!(outcome.stdout.contains("Alpha tool."));

    let missing = session.exec("tools info ghost").await;
    assert_eq!(missing.status, ExecOutcome::ROUTER_FAILURE_STATUS);
    assert!(missing.stderr.contains("Unknown tool: ghost"));
}

#[tokio::test]
async fn test_tools_run_requires_environment() {
    let fx = Fixture::new();
    let outcome = fx.session().exec("tools run \"1 + 1\"").await;

    assert_eq!(outcome.status, ExecOutcome::ROUTER_FAILURE_STATUS);
    assert!(outcome.stderr.contains("aep tool sync"));
    assert_eq!(fx.port.create_count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_tools_run_uses_tools_interpreter() {
    let fx = Fixture::new();
    fx.store.init_tool_environment(&[], false).await.unwrap();

    let outcome = fx.session().exec("tools run 'print(1)'").await;

    assert_eq!(outcome.status, 0, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        format!(
            "code=print(1) tools={} cwd={}\n",
            fx.store.layout().tools_dir().display(),
            fx.workspace().display()
        )
    );
}

#[tokio::test]
async fn test_skills_run_missing_skill_is_not_spawned() {
    let fx = Fixture::new();
    let outcome = fx.session().exec("skills run missing/x.py").await;

    assert_eq!(outcome.status, ExecOutcome::ROUTER_FAILURE_STATUS);
    assert!(outcome.stderr.contains("Unknown skill: missing/x.py"));
    assert!(outcome.stdout.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_skills_run_shell_script() {
    let fx = Fixture::new();
    fx.add_skill("demo", &[("run.sh", "echo \"args: $*\"\nbasename \"$(pwd)\"\n")])
        .await;

    let outcome = fx.session().exec("skills run demo/run.sh one 'two three'").await;

    assert_eq!(outcome.status, 0, "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout, "args: one two three\ndemo\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_skills_run_python_uses_skill_environment() {
    let fx = Fixture::new();
    fx.add_skill("demo", &[("main.py", "print('hi')\n")]).await;

    let outcome = fx.session().exec("skills run demo/main.py --flag x").await;

    assert_eq!(outcome.status, 0, "stderr: {}", outcome.stderr);
    let venv = fx.store.layout().env_dir(&aep_protocols::Scope::skill("demo"));
    assert_eq!(
        outcome.stdout,
        format!("script=main.py args=--flag x venv={}\n", venv.display())
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_skills_run_propagates_exit_status() {
    let fx = Fixture::new();
    fx.add_skill("demo", &[("fail.sh", "echo broken >&2\nexit 4\n")]).await;

    let outcome = fx.session().exec("skills run demo/fail.sh").await;

    assert_eq!(outcome.status, 4);
    assert_eq!(outcome.stderr, "broken\n");
}

#[tokio::test]
async fn test_skills_run_cannot_escape_skill_dir() {
    let fx = Fixture::new();
    fx.add_skill("demo", &[("run.sh", "echo hi\n")]).await;
    fx.add_tool("alpha", "x = 1\n").await;

    let outcome = fx.session().exec("skills run demo/../../tools/alpha.py").await;
    assert_eq!(outcome.status, ExecOutcome::ROUTER_FAILURE_STATUS);
}

#[tokio::test]
async fn test_skills_list_and_info() {
    let fx = Fixture::new();
    fx.add_skill("demo", &[]).await;
    let mut session = fx.session();

    assert_eq!(session.exec("skills list").await.stdout, "demo\n");
    let info = session.exec("skills info demo").await;
    assert!(info.stdout.contains("description: Demo skill"));
    assert_eq!(
        session.exec("skills info ghost").await.status,
        ExecOutcome::ROUTER_FAILURE_STATUS
    );
}

#[tokio::test]
async fn test_shell_passthrough() {
    let fx = Fixture::new();
    let outcome = fx.session().exec("echo hi").await;
    assert_eq!(outcome.stdout, "hi\n");
    assert_eq!(outcome.status, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cd_changes_shell_directory() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.workspace().join("sub")).unwrap();
    let mut session = fx.session();

    let outcome = session.exec("cd sub").await;
    let expected = fx.workspace().join("sub").canonicalize().unwrap();
    assert_eq!(outcome.stdout, format!("{}\n", expected.display()));
    assert_eq!(session.cwd(), expected);

    let pwd = session.exec("pwd").await;
    assert_eq!(Path::new(pwd.stdout.trim()).canonicalize().unwrap(), expected);

    session.exec("cd").await;
    assert_eq!(session.cwd(), fx.workspace());
}

#[tokio::test]
async fn test_cd_missing_directory() {
    let fx = Fixture::new();
    let mut session = fx.session();

    let outcome = session.exec("cd nowhere").await;

    assert_eq!(outcome.status, ExecOutcome::ROUTER_FAILURE_STATUS);
    assert_eq!(session.cwd(), fx.workspace());
}

#[cfg(unix)]
#[tokio::test]
async fn test_export_reaches_children() {
    let fx = Fixture::new();
    let mut session = fx.session();

    assert_eq!(session.exec("export GREETING=hello WHO=world").await.status, 0);
    assert_eq!(session.exec("echo $GREETING $WHO").await.stdout, "hello world\n");
    assert_eq!(
        session.exec("export").await.stdout,
        "GREETING=hello\nWHO=world\n"
    );
    assert_eq!(session.env().len(), 2);
}

#[tokio::test]
async fn test_parse_errors_are_usage() {
    let fx = Fixture::new();
    let mut session = fx.session();

    assert_eq!(
        session.exec("tools").await.status,
        ExecOutcome::USAGE_STATUS
    );
    assert_eq!(
        session.exec("echo 'unterminated").await.status,
        ExecOutcome::USAGE_STATUS
    );
}

#[tokio::test]
async fn test_context_concatenates_indexes() {
    let fx = Fixture::new();
    fx.add_tool("alpha", "\"\"\"Alpha tool.\"\"\"\n").await;
    fx.store.index().unwrap();

    let context = fx.session().context();
    assert!(context.contains("`alpha`: Alpha tool. Use `tools run \"tools.alpha.<func>(...)\"`"));
    assert!(context.contains("# Library"));
}
