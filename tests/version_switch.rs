//! Integration tests for the PHP-FPM orchestrator.
//!
//! These drive the real package-manager and service-manager implementations
//! through a scripted command runner and an in-memory filesystem, verifying
//! the version-switch state machine end to end.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use phpup::config::{LoggingConfig, PathsConfig, Settings, UserConfig};
use phpup::error::{PhpupError, PhpupResult};
use phpup::executor::{CommandRunner, ExecOutput};
use phpup::filesystem::Filesystem;
use phpup::fpm::PhpFpm;
use phpup::pm::{Apt, PackageManager, Pacman};
use phpup::sm::{ServiceManager, Systemd};

/// Command runner matching commands against scripted responses and
/// recording everything it runs.
#[derive(Default)]
struct RecordingRunner {
    responses: Mutex<Vec<(String, ExecOutput)>>,
    commands: Mutex<Vec<String>>,
}

impl RecordingRunner {
    fn new() -> Self {
        Self::default()
    }

    fn succeed_on(&self, pattern: &str, stdout: &str) {
        self.responses.lock().unwrap().push((
            pattern.to_string(),
            ExecOutput {
                success: true,
                exit_code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
    }

    fn fail_on(&self, pattern: &str, code: i32, stderr: &str) {
        self.responses.lock().unwrap().push((
            pattern.to_string(),
            ExecOutput {
                success: false,
                exit_code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn ran(&self, pattern: &str) -> bool {
        self.commands().iter().any(|c| c.contains(pattern))
    }

    fn count_matching(&self, pattern: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(pattern)).count()
    }
}

impl CommandRunner for RecordingRunner {
    fn execute(&self, command: &str) -> PhpupResult<ExecOutput> {
        self.commands.lock().unwrap().push(command.to_string());
        let responses = self.responses.lock().unwrap();
        for (pattern, output) in responses.iter() {
            if command.contains(pattern.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(ExecOutput {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// In-memory filesystem double.
#[derive(Default)]
struct MemoryFilesystem {
    files: Mutex<HashMap<PathBuf, String>>,
    dirs: Mutex<HashSet<PathBuf>>,
    links: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl MemoryFilesystem {
    fn new() -> Self {
        Self::default()
    }

    fn add_dir(&self, path: &str) {
        self.dirs.lock().unwrap().insert(PathBuf::from(path));
    }

    fn add_link(&self, path: &str, target: &str) {
        self.links
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), PathBuf::from(target));
    }

    fn write(&self, path: &Path, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
    }

    fn content(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
            || self.dirs.lock().unwrap().contains(path)
    }

    fn get(&self, path: &Path) -> PhpupResult<String> {
        self.content(path).ok_or_else(|| {
            PhpupError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    fn put_as_user(&self, path: &Path, content: &str, _owner: &str) -> PhpupResult<()> {
        self.write(path, content);
        Ok(())
    }

    fn unlink(&self, path: &Path) -> PhpupResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn read_link(&self, path: &Path) -> PhpupResult<PathBuf> {
        self.links.lock().unwrap().get(path).cloned().ok_or_else(|| {
            PhpupError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a symlink", path.display()),
            ))
        })
    }

    fn ensure_dir_exists(&self, path: &Path, _owner: &str) -> PhpupResult<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }
}

const HOME: &str = "/home/dev/.phpup";
const MARKER: &str = "/home/dev/.phpup/php_version";

fn test_settings() -> Settings {
    Settings {
        user: UserConfig {
            name: "dev".to_string(),
            group: "dev".to_string(),
        },
        paths: PathsConfig {
            home: PathBuf::from(HOME),
            php_binary: PathBuf::from("/usr/bin/php"),
        },
        logging: LoggingConfig::default(),
    }
}

/// A Debian-flavored system with PHP 8.1 as the default and 8.1 installed.
struct Fixture {
    runner: Arc<RecordingRunner>,
    fs: Arc<MemoryFilesystem>,
}

impl Fixture {
    fn new() -> Self {
        let runner = Arc::new(RecordingRunner::new());
        let fs = Arc::new(MemoryFilesystem::new());

        fs.add_link("/usr/bin/php", "/usr/bin/php8.1");
        fs.add_dir("/etc/php/8.1/fpm/pool.d");
        fs.add_dir("/etc/php/7.4/fpm/pool.d");

        runner.succeed_on("dpkg-query", "php8.1-fpm\nphp8.1-cli\nnginx\n");
        // Responses are static: `is-enabled` reports the state services hold
        // mid-switch, after the old unit has been disabled.
        runner.succeed_on("is-enabled php8.1-fpm", "disabled\n");
        runner.succeed_on("is-enabled php7.4-fpm", "disabled\n");
        runner.succeed_on(
            "status php8.1-fpm",
            "php8.1-fpm.service - The PHP 8.1 FastCGI Process Manager\n\
             Active: active (running)",
        );
        runner.succeed_on(
            "status php7.4-fpm",
            "php7.4-fpm.service - The PHP 7.4 FastCGI Process Manager\n\
             Active: inactive (dead)",
        );

        Self { runner, fs }
    }

    fn orchestrator(&self) -> PhpFpm {
        let runner: Arc<dyn CommandRunner> = self.runner.clone();
        let fs: Arc<dyn Filesystem> = self.fs.clone();
        let pm: Arc<dyn PackageManager> = Arc::new(Apt::new(Arc::clone(&runner)));
        let sm: Arc<dyn ServiceManager> = Arc::new(Systemd::new(Arc::clone(&runner)));
        PhpFpm::new(pm, sm, fs, runner, test_settings()).unwrap()
    }
}

#[test]
fn version_resolution_without_marker_tracks_default() {
    let fixture = Fixture::new();
    let fpm = fixture.orchestrator();

    assert_eq!(fpm.get_version(false).unwrap(), "8.1");
    assert_eq!(fpm.get_version(true).unwrap(), "8.1");
    assert_eq!(fpm.current_version(), "8.1");
    assert_eq!(fpm.fpm_service_name().unwrap(), "php8.1-fpm");
}

#[test]
fn marker_overrides_reported_version_but_not_real() {
    let fixture = Fixture::new();
    fixture.fs.write(Path::new(MARKER), "7.4\n");
    let fpm = fixture.orchestrator();

    assert_eq!(fpm.current_version(), "7.4");
    assert_eq!(fpm.get_version(false).unwrap(), "7.4");
    assert_eq!(fpm.get_version(true).unwrap(), "8.1");
}

#[test]
fn successful_switch_pins_the_new_version() {
    let fixture = Fixture::new();
    let mut fpm = fixture.orchestrator();

    let switch = fpm.change_version(Some("7.4"), false, false).unwrap();

    assert!(switch.error.is_none());
    assert_eq!(switch.old_version, "8.1");
    assert_eq!(switch.version, "7.4");
    assert_eq!(fpm.current_version(), "7.4");
    assert_eq!(
        fixture.fs.content(Path::new(MARKER)).as_deref(),
        Some("7.4")
    );

    // Old service torn down, new one installed and brought up.
    assert!(fixture.runner.ran("systemctl stop php8.1-fpm"));
    assert!(fixture.runner.ran("systemctl disable php8.1-fpm"));
    assert!(fixture.runner.ran("apt-get install -y --no-install-recommends php7.4-fpm"));
    assert!(fixture.runner.ran("systemctl restart php7.4-fpm"));

    // Pool config written into the 7.4 pool directory.
    let pool = Path::new("/etc/php/7.4/fpm/pool.d/phpup.conf");
    let content = fixture.fs.content(pool).expect("pool config written");
    assert!(content.contains("user = dev"));
}

#[test]
fn failed_install_rolls_back_and_retains_the_error() {
    let fixture = Fixture::new();
    fixture.runner.fail_on(
        "apt-get install -y --no-install-recommends php7.4-fpm",
        100,
        "E: Unable to locate package php7.4-fpm",
    );
    let mut fpm = fixture.orchestrator();

    let switch = fpm.change_version(Some("7.4"), false, false).unwrap();

    // Rolled back to the old version with the error retained, not thrown.
    assert_eq!(switch.version, "8.1");
    assert_eq!(fpm.current_version(), "8.1");
    let err = switch.error.expect("install error retained");
    assert!(err.is_install_error());
    assert!(err.to_string().contains("php7.4-fpm"));

    // The 8.1 service was re-enabled after having been disabled.
    assert!(fixture.runner.ran("systemctl enable php8.1-fpm"));

    // Back on the real default, so no marker is written.
    assert!(fixture.fs.content(Path::new(MARKER)).is_none());
}

#[test]
fn switching_to_default_resolves_real_version_and_deletes_marker() {
    let fixture = Fixture::new();
    fixture.fs.write(Path::new(MARKER), "7.4");
    let mut fpm = fixture.orchestrator();
    assert_eq!(fpm.current_version(), "7.4");

    let switch = fpm.change_version(Some("default"), false, false).unwrap();

    assert!(switch.error.is_none());
    assert_eq!(switch.version, "8.1");
    assert!(fixture.fs.content(Path::new(MARKER)).is_none());
}

#[test]
fn unspecified_target_behaves_like_default() {
    let fixture = Fixture::new();
    fixture.fs.write(Path::new(MARKER), "7.4");
    let mut fpm = fixture.orchestrator();

    let switch = fpm.change_version(None, false, false).unwrap();
    assert_eq!(switch.version, "8.1");
}

#[test]
fn install_skips_package_step_when_already_installed() {
    let fixture = Fixture::new();
    let fpm = fixture.orchestrator();

    fpm.install().unwrap();

    // 8.1 FPM is already installed; only the pool refresh and restart run.
    assert_eq!(fixture.runner.count_matching("apt-get install"), 0);
    assert!(fixture.runner.ran("systemctl restart php8.1-fpm"));
    assert!(fixture
        .fs
        .content(Path::new("/etc/php/8.1/fpm/pool.d/phpup.conf"))
        .is_some());
}

#[test]
fn uninstall_removes_pool_config_and_stops_service() {
    let fixture = Fixture::new();
    let fpm = fixture.orchestrator();
    let pool = Path::new("/etc/php/8.1/fpm/pool.d/phpup.conf");
    fixture.fs.write(pool, "[phpup]");

    fpm.uninstall().unwrap();

    assert!(fixture.fs.content(pool).is_none());
    assert!(fixture.runner.ran("systemctl stop php8.1-fpm"));
}

#[test]
fn uninstall_without_pool_config_is_a_noop() {
    let fixture = Fixture::new();
    let fpm = fixture.orchestrator();

    fpm.uninstall().unwrap();

    assert!(!fixture.runner.ran("systemctl stop"));
}

#[test]
fn service_name_resolution_fails_for_unknown_units() {
    let fixture = Fixture::new();
    fixture.fs.write(Path::new(MARKER), "9.9");
    // Real systemctl prints the not-found diagnostic to stderr with exit 4
    // and an empty stdout.
    fixture.runner.fail_on(
        "status php9.9-fpm",
        4,
        "Unit php9.9-fpm.service could not be found.",
    );
    let fpm = fixture.orchestrator();

    let err = fpm.fpm_service_name().unwrap_err();
    match err {
        PhpupError::ServiceNameResolution { service, status } => {
            assert_eq!(service, "php9.9-fpm");
            assert!(status.contains("could not be found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn supported_versions_guard_rejects_unshipped_versions() {
    let fixture = Fixture::new();
    let fpm = fixture.orchestrator();

    assert_eq!(fpm.supported_php_versions().first(), Some(&"8.4"));
    assert!(fpm.validate_version("7.4").is_ok());

    let err = fpm.validate_version("5.6").unwrap_err();
    assert!(err.to_string().contains("5.6"));
    assert!(err.to_string().contains("apt"));
}

#[test]
fn install_skips_extensions_on_distros_that_bundle_them() {
    let runner = Arc::new(RecordingRunner::new());
    let fs = Arc::new(MemoryFilesystem::new());
    fs.add_link("/usr/bin/php", "/usr/bin/php8.4");
    fs.add_dir("/etc/php/php-fpm.d");
    runner.succeed_on("pacman -Qq", "nginx\n");
    runner.succeed_on("is-enabled php-fpm", "disabled\n");

    let shared: Arc<dyn CommandRunner> = runner.clone();
    let pm: Arc<dyn PackageManager> = Arc::new(Pacman::new(Arc::clone(&shared)));
    let sm: Arc<dyn ServiceManager> = Arc::new(Systemd::new(Arc::clone(&shared)));
    let fs_dyn: Arc<dyn Filesystem> = fs.clone();
    let fpm = PhpFpm::new(pm, sm, fs_dyn, shared, test_settings()).unwrap();

    // FPM itself gets installed; the declined extension set is skipped
    // without failing the operation.
    fpm.install().unwrap();

    assert_eq!(runner.count_matching("pacman -S"), 1);
    assert!(runner.ran("pacman -S --noconfirm --needed php-fpm"));
    assert!(runner.ran("systemctl restart php-fpm"));
    assert!(fs
        .content(Path::new("/etc/php/php-fpm.d/phpup.conf"))
        .is_some());
}

#[test]
fn config_path_picks_first_existing_candidate() {
    let fixture = Fixture::new();
    let fpm = fixture.orchestrator();

    // Debian layout exists in the fixture and outranks the rest.
    assert_eq!(
        fpm.fpm_config_path().unwrap(),
        PathBuf::from("/etc/php/8.1/fpm/pool.d")
    );
}

#[test]
fn config_path_falls_back_in_distro_order() {
    let runner = Arc::new(RecordingRunner::new());
    let fs = Arc::new(MemoryFilesystem::new());
    fs.add_link("/usr/bin/php", "/usr/bin/php8.1");
    fs.add_dir("/etc/php-fpm.d");
    runner.succeed_on("dpkg-query", "php8.1-fpm\n");

    let fixture = Fixture { runner, fs };
    let fpm = fixture.orchestrator();

    assert_eq!(fpm.fpm_config_path().unwrap(), PathBuf::from("/etc/php-fpm.d"));
}

#[test]
fn config_path_errors_when_no_candidate_exists() {
    let runner = Arc::new(RecordingRunner::new());
    let fs = Arc::new(MemoryFilesystem::new());
    fs.add_link("/usr/bin/php", "/usr/bin/php8.1");

    let fixture = Fixture { runner, fs };
    let fpm = fixture.orchestrator();

    let err = fpm.fpm_config_path().unwrap_err();
    match err {
        PhpupError::ConfigPathNotFound { checked } => {
            assert!(checked.contains("/etc/php/8.1/fpm/pool.d"));
            assert!(checked.contains("/etc/php-fpm.d"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn cli_alias_and_extensions_use_the_post_switch_version() {
    let fixture = Fixture::new();
    fixture.runner.fail_on(
        "apt-get install -y --no-install-recommends php7.4-fpm",
        100,
        "E: Unable to locate package php7.4-fpm",
    );
    let mut fpm = fixture.orchestrator();

    let switch = fpm.change_version(Some("7.4"), true, false).unwrap();

    // After the rollback the alias update targets the reverted version.
    assert!(switch.error.is_some());
    assert!(fixture
        .runner
        .ran("update-alternatives --set php /usr/bin/php8.1"));
    assert!(!fixture
        .runner
        .ran("update-alternatives --set php /usr/bin/php7.4"));
}
