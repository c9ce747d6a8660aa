//! Launch script rendering.
//!
//! A launch script records its own pid in the marker file, enters the
//! working directory, exports the session environment and finally runs the
//! requested command.

use std::fmt::Write as _;
use std::path::Path;

use sessiondeck_core::{Error, Platform, Result};

use super::{LaunchRequest, SESSION_ID_ENV};

/// Render the launch script for `platform`.
pub fn render(platform: Platform, request: &LaunchRequest, marker: &Path) -> Result<String> {
    validate_env_keys(request)?;
    if request.args.is_empty() {
        return Err(Error::InvalidInput(format!(
            "session {} has an empty command line",
            request.session_id
        )));
    }

    Ok(if platform.is_unix() {
        render_posix(request, marker)
    } else {
        render_powershell(request, marker)
    })
}

fn validate_env_keys(request: &LaunchRequest) -> Result<()> {
    for key in request.env.keys() {
        let mut chars = key.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidInput(format!(
                "invalid environment variable name: {key:?}"
            )));
        }
    }
    Ok(())
}

fn posix_quote(value: &str) -> String {
    shell_words::quote(value).into_owned()
}

fn render_posix(request: &LaunchRequest, marker: &Path) -> String {
    let mut script = String::from("#!/bin/sh\n");

    // `$$` stays the command's pid because of the final `exec`.
    let _ = writeln!(
        script,
        "echo $$ > {}",
        posix_quote(&marker.to_string_lossy())
    );
    let _ = writeln!(
        script,
        "cd {} || exit 1",
        posix_quote(&request.working_dir.to_string_lossy())
    );
    for (key, value) in &request.env {
        let _ = writeln!(script, "export {key}={}", posix_quote(value));
    }
    let _ = writeln!(
        script,
        "export {SESSION_ID_ENV}={}",
        posix_quote(&request.session_id)
    );
    let _ = writeln!(script, "exec {}", shell_words::join(&request.args));

    script
}

fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn render_powershell(request: &LaunchRequest, marker: &Path) -> String {
    let mut script = String::new();

    let _ = writeln!(
        script,
        "$PID | Out-File -Encoding ascii -NoNewline -LiteralPath {}",
        powershell_quote(&marker.to_string_lossy())
    );
    let _ = writeln!(
        script,
        "Set-Location -LiteralPath {}",
        powershell_quote(&request.working_dir.to_string_lossy())
    );
    for (key, value) in &request.env {
        let _ = writeln!(script, "$env:{key} = {}", powershell_quote(value));
    }
    let _ = writeln!(
        script,
        "$env:{SESSION_ID_ENV} = {}",
        powershell_quote(&request.session_id)
    );
    let command: Vec<String> = request.args.iter().map(|a| powershell_quote(a)).collect();
    let _ = writeln!(script, "& {}", command.join(" "));
    script.push_str("exit $LASTEXITCODE\n");

    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn request() -> LaunchRequest {
        let mut env = BTreeMap::new();
        env.insert("API_MODE".to_string(), "it's live".to_string());
        LaunchRequest {
            session_id: "demo-1".to_string(),
            working_dir: PathBuf::from("/work/my project"),
            args: vec!["agent".to_string(), "--task".to_string(), "fix bug".to_string()],
            env,
        }
    }

    #[test]
    fn test_posix_script_layout() {
        let script = render(Platform::Linux, &request(), Path::new("/run/demo-1.pid")).unwrap();
        let lines: Vec<&str> = script.lines().collect();
        let words = |line: &str| shell_words::split(line).unwrap();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "#!/bin/sh");
        assert_eq!(words(lines[1]), ["echo", "$$", ">", "/run/demo-1.pid"]);
        assert_eq!(words(lines[2]), ["cd", "/work/my project", "||", "exit", "1"]);
        assert_eq!(words(lines[3]), ["export", "API_MODE=it's live"]);
        assert_eq!(words(lines[4]), ["export", "SESSIONDECK_SESSION_ID=demo-1"]);
        assert!(lines[5].starts_with("exec "));
    }

    #[test]
    fn test_posix_script_round_trips_arguments() {
        let script = render(Platform::MacOS, &request(), Path::new("/run/m.pid")).unwrap();
        let exec_line = script.lines().last().unwrap();
        let words = shell_words::split(exec_line.trim_start_matches("exec ")).unwrap();
        assert_eq!(words, request().args);
    }

    #[test]
    fn test_powershell_script_layout() {
        let script =
            render(Platform::Windows, &request(), Path::new(r"C:\run\demo-1.pid")).unwrap();
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(
            lines[0],
            r"$PID | Out-File -Encoding ascii -NoNewline -LiteralPath 'C:\run\demo-1.pid'"
        );
        assert_eq!(lines[1], "Set-Location -LiteralPath '/work/my project'");
        assert_eq!(lines[2], "$env:API_MODE = 'it''s live'");
        assert_eq!(lines[3], "$env:SESSIONDECK_SESSION_ID = 'demo-1'");
        assert_eq!(lines[4], "& 'agent' '--task' 'fix bug'");
        assert_eq!(lines[5], "exit $LASTEXITCODE");
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut req = request();
        req.args.clear();
        let result = render(Platform::Linux, &req, Path::new("/run/x.pid"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_env_key_rejected() {
        for key in ["1ABC", "A-B", "", "X Y"] {
            let mut req = request();
            req.env.insert(key.to_string(), "v".to_string());
            let result = render(Platform::Linux, &req, Path::new("/run/x.pid"));
            assert!(matches!(result, Err(Error::InvalidInput(_))), "{key:?}");
        }
    }
}
