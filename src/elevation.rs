// Privilege checks and elevated relaunch

use crate::error::Result;

/// Outcome of [`ensure_elevated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// The process already runs with administrator/root rights
    AlreadyElevated,
    /// An elevated copy was started; this instance should exit
    Relaunched,
    /// The platform has no relaunch mechanism; continue with reduced data
    Unsupported,
}

/// Makes sure the process runs elevated, restarting itself if required.
///
/// # Arguments
/// * `forwarded_args` - original command line (without the program name)
pub fn ensure_elevated(forwarded_args: &[String]) -> Result<Elevation> {
    if platform::is_elevated() {
        return Ok(Elevation::AlreadyElevated);
    }
    platform::relaunch_elevated(&join_command_line(forwarded_args))
}

/// Shows a blocking error notice. Used right before terminating.
pub fn show_fatal(title: &str, message: &str) {
    tracing::error!("{title}: {message}");
    platform::show_fatal(title, message);
}

/// Joins arguments into one command line using the Windows quoting rules,
/// so the elevated instance receives exactly the same argv.
pub fn join_command_line(args: &[String]) -> String {
    args.iter()
        .map(|a| quote_arg(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                // Backslashes before a quote are doubled, then the quote is escaped
                out.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat_n('\\', backslashes * 2));
    out.push('"');
    out
}

#[cfg(windows)]
mod platform {
    use super::Elevation;
    use crate::error::{AppError, Result};
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::ptr::{null, null_mut};
    use windows_sys::Win32::UI::Shell::{IsUserAnAdmin, ShellExecuteW};
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        MB_ICONERROR, MB_OK, MessageBoxW, SW_SHOWNORMAL,
    };

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    pub fn is_elevated() -> bool {
        unsafe { IsUserAnAdmin() != 0 }
    }

    pub fn relaunch_elevated(parameters: &str) -> Result<Elevation> {
        let exe = std::env::current_exe().map_err(|e| AppError::Elevation(e.to_string()))?;
        let verb = to_wide(OsStr::new("runas"));
        let file = to_wide(exe.as_os_str());
        let params = to_wide(OsStr::new(parameters));

        let result = unsafe {
            ShellExecuteW(
                null_mut(),
                verb.as_ptr(),
                file.as_ptr(),
                params.as_ptr(),
                null(),
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 mean success
        if result as isize > 32 {
            Ok(Elevation::Relaunched)
        } else {
            Err(AppError::Elevation(format!(
                "ShellExecuteW(runas) returned {}",
                result as isize
            )))
        }
    }

    pub fn show_fatal(title: &str, message: &str) {
        let title = to_wide(OsStr::new(title));
        let message = to_wide(OsStr::new(message));
        unsafe {
            MessageBoxW(null_mut(), message.as_ptr(), title.as_ptr(), MB_OK | MB_ICONERROR);
        }
    }
}

#[cfg(unix)]
mod platform {
    use super::Elevation;
    use crate::error::Result;

    pub fn is_elevated() -> bool {
        nix::unistd::geteuid().is_root()
    }

    pub fn relaunch_elevated(_parameters: &str) -> Result<Elevation> {
        Ok(Elevation::Unsupported)
    }

    pub fn show_fatal(title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

#[cfg(not(any(windows, unix)))]
mod platform {
    use super::Elevation;
    use crate::error::Result;

    pub fn is_elevated() -> bool {
        true
    }

    pub fn relaunch_elevated(_parameters: &str) -> Result<Elevation> {
        Ok(Elevation::Unsupported)
    }

    pub fn show_fatal(title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_arguments_are_not_quoted() {
        assert_eq!(join_command_line(&args(&["--cpuinfo"])), "--cpuinfo");
        assert_eq!(
            join_command_line(&args(&["--cpuinfo", "--no-elevate"])),
            "--cpuinfo --no-elevate"
        );
    }

    #[test]
    fn spaces_and_empty_arguments_are_quoted() {
        assert_eq!(
            join_command_line(&args(&["--config", "C:\\My Settings\\a.toml"])),
            "--config \"C:\\My Settings\\a.toml\""
        );
        assert_eq!(join_command_line(&args(&[""])), "\"\"");
    }

    #[test]
    fn quotes_and_trailing_backslashes_are_escaped() {
        assert_eq!(quote_arg("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_arg("dir with space\\"), "\"dir with space\\\\\"");
    }
}
