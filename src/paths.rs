use std::path::PathBuf;

/// Default directory for persisted machine configurations
pub fn default_config_dir() -> PathBuf {
    PathBuf::from("/etc/qemu.d")
}

/// Path to a machine's persisted configuration file
pub fn machine_config_path(config_dir: &std::path::Path, name: &str) -> PathBuf {
    config_dir.join(format!("{}.cfg", sanitize_name(name)))
}

/// Path to a machine's QMP control socket.
///
/// The socket is created by the running machine (qemu `-qmp unix:...`); we
/// only ever connect to it.
pub fn qmp_socket_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}.qmp", sanitize_name(name)))
}

/// Path to a machine's human monitor socket
pub fn monitor_socket_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}.monitor", sanitize_name(name)))
}

/// Path to a machine's pidfile
pub fn pidfile_path(name: &str) -> PathBuf {
    PathBuf::from(format!("/run/qvm_{}.pid", sanitize_name(name)))
}

/// Strip characters that would let a machine name escape the directories
/// its derived paths live in.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '/' | '\\' | '\0'))
        .map(|c| if c == '.' { '_' } else { c })
        .collect()
}
