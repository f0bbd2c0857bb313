//! FPM pool configuration rendering.

use std::path::Path;

use tera::{Context, Tera};

use crate::error::{PhpupError, PhpupResult};

/// The pool configuration stub written into the distro's pool directory.
const POOL_TEMPLATE: &str = r#"; Managed by phpup. Do not edit.

[phpup]
user = {{ user }}
group = {{ group }}

listen = {{ home }}/phpup.sock
listen.owner = {{ user }}
listen.group = {{ group }}
listen.mode = 0660

pm = dynamic
pm.max_children = 5
pm.start_servers = 2
pm.min_spare_servers = 1
pm.max_spare_servers = 3
pm.max_requests = 500

php_admin_value[error_log] = {{ home }}/log/fpm-error.log
"#;

/// File name of the orchestrator-managed pool config.
pub const POOL_CONFIG_NAME: &str = "phpup.conf";

/// Render the pool configuration for the managing user.
pub fn render_pool_config(user: &str, group: &str, home: &Path) -> PhpupResult<String> {
    let context = Context::from_serialize(serde_json::json!({
        "user": user,
        "group": group,
        "home": home.to_string_lossy(),
    }))
    .map_err(|e| PhpupError::Template {
        message: format!("Invalid pool template context: {}", e),
    })?;

    Tera::one_off(POOL_TEMPLATE, &context, false).map_err(|e| PhpupError::Template {
        message: format!("Failed to render pool template: {}", e),
    })
}
