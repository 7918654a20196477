use std::ffi::OsString;
use std::path::Path;
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::catalog::Episode;

#[cfg(unix)]
use std::os::unix::process::CommandExt;

#[derive(Debug, Clone)]
pub(crate) struct PlaybackOutcome {
    pub(crate) success: bool,
    pub(crate) status: ExitStatus,
}

/// Hands the episode's video URL to the external player and waits for it.
/// The caller must release the terminal first.
pub(crate) fn play_episode(
    player: &Path,
    drama_title: &str,
    episode: &Episode,
) -> Result<PlaybackOutcome> {
    if !episode.has_video() {
        return Err(anyhow!(
            "no video source available for {} ({})",
            episode.label(),
            episode.title
        ));
    }

    let args = player_args(player, drama_title, episode);
    info!(player = %player.display(), episode = %episode.id, "launching player");
    let status = with_sigint_ignored(|| {
        let mut cmd = ProcessCommand::new(player);
        cmd.args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        run_interactive_cmd(cmd)
            .with_context(|| format!("failed to launch {}", player.display()))
    })?;

    if !status.success() {
        warn!(%status, "player exited unsuccessfully");
    }
    Ok(PlaybackOutcome {
        success: status.success(),
        status,
    })
}

pub(crate) fn player_args(player: &Path, drama_title: &str, episode: &Episode) -> Vec<OsString> {
    let mut args = Vec::new();
    let is_mpv = player
        .file_stem()
        .is_some_and(|stem| stem.eq_ignore_ascii_case("mpv"));
    if is_mpv {
        args.push(OsString::from(format!(
            "--force-media-title={drama_title} - {}",
            episode.title
        )));
    }
    args.push(OsString::from(&episode.video_url));
    args
}

pub(crate) fn playback_message(
    drama_title: &str,
    episode: &Episode,
    outcome: &PlaybackOutcome,
) -> String {
    if outcome.success {
        return format!("Finished {drama_title} · {}", episode.label());
    }
    format!(
        "Player exited with status {} for {}",
        outcome.status,
        episode.label()
    )
}

#[cfg(unix)]
struct ScopedSigaction {
    signum: libc::c_int,
    old_action: libc::sigaction,
}

#[cfg(unix)]
impl ScopedSigaction {
    fn ignore(signum: libc::c_int) -> Result<Self> {
        unsafe {
            let mut new_action: libc::sigaction = std::mem::zeroed();
            new_action.sa_sigaction = libc::SIG_IGN;
            libc::sigemptyset(&mut new_action.sa_mask);
            new_action.sa_flags = 0;

            let mut old_action: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signum, &new_action, &mut old_action) != 0 {
                return Err(anyhow!("failed to update signal action for {signum}"));
            }

            Ok(Self { signum, old_action })
        }
    }
}

#[cfg(unix)]
impl Drop for ScopedSigaction {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::sigaction(self.signum, &self.old_action, std::ptr::null_mut());
        }
    }
}

/// Returns the terminal to our process group if it was handed to the player.
#[cfg(unix)]
struct ForegroundGuard {
    stdin_fd: libc::c_int,
    parent_pgrp: libc::pid_t,
    handed_off: bool,
}

#[cfg(unix)]
impl ForegroundGuard {
    fn new(stdin_fd: libc::c_int, parent_pgrp: libc::pid_t) -> Self {
        Self {
            stdin_fd,
            parent_pgrp,
            handed_off: false,
        }
    }

    fn hand_off(&mut self, child_pgrp: libc::pid_t) {
        self.handed_off = unsafe { libc::tcsetpgrp(self.stdin_fd, child_pgrp) == 0 };
    }
}

#[cfg(unix)]
impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        if !self.handed_off {
            return;
        }
        unsafe {
            let _ = libc::tcsetpgrp(self.stdin_fd, self.parent_pgrp);
        }
    }
}

#[cfg(unix)]
fn with_sigint_ignored<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R>,
{
    let _sigint_guard = ScopedSigaction::ignore(libc::SIGINT)?;
    f()
}

#[cfg(not(unix))]
fn with_sigint_ignored<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R>,
{
    f()
}

#[cfg(unix)]
fn run_interactive_cmd(mut cmd: ProcessCommand) -> Result<ExitStatus> {
    let stdin_fd = libc::STDIN_FILENO;
    let parent_pgrp = unsafe { libc::tcgetpgrp(stdin_fd) };
    if parent_pgrp == -1 {
        return cmd.status().context("failed to launch player");
    }

    let _sigttou_guard = ScopedSigaction::ignore(libc::SIGTTOU)?;
    let mut foreground = ForegroundGuard::new(stdin_fd, parent_pgrp);

    unsafe {
        cmd.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGQUIT, libc::SIG_DFL);
            libc::signal(libc::SIGTSTP, libc::SIG_DFL);
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = cmd.spawn().context("failed to spawn player")?;
    foreground.hand_off(child.id() as libc::pid_t);
    child.wait().context("failed waiting on player")
}

#[cfg(not(unix))]
fn run_interactive_cmd(mut cmd: ProcessCommand) -> Result<ExitStatus> {
    cmd.status().context("failed to launch player")
}
