use crate::config::toml_config::FeedbackConfig;
use crate::domain::ports::Feedback;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Upper bound on the volume command; the cue plays regardless.
const VOLUME_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    Success,
    Failure,
}

/// Plays an audio asset per cue through an external player.
///
/// Playback is fire-and-forget; a missing asset or player only logs a warning.
#[derive(Debug, Clone)]
pub struct SoundFeedback {
    player: String,
    player_args: Vec<String>,
    volume_command: Option<Vec<String>>,
    volume_timeout: Duration,
    success_sound: PathBuf,
    failure_sound: PathBuf,
}

impl SoundFeedback {
    pub fn new(config: &FeedbackConfig) -> Self {
        Self {
            player: config.player.clone(),
            player_args: config.player_args.clone(),
            volume_command: config.volume_command.clone().filter(|argv| !argv.is_empty()),
            volume_timeout: VOLUME_COMMAND_TIMEOUT,
            success_sound: PathBuf::from(&config.success_sound),
            failure_sound: PathBuf::from(&config.failure_sound),
        }
    }

    fn asset(&self, cue: Cue) -> &Path {
        match cue {
            Cue::Success => &self.success_sound,
            Cue::Failure => &self.failure_sound,
        }
    }

    async fn set_volume(&self) {
        let Some((program, args)) = self.volume_command.as_ref().and_then(|argv| argv.split_first())
        else {
            return;
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        match tokio::time::timeout(self.volume_timeout, command.status()).await {
            Ok(Ok(status)) if !status.success() => {
                tracing::warn!("🔈 Volume command '{}' exited with {}", program, status)
            }
            Ok(Err(e)) => tracing::warn!("🔈 Could not run volume command '{}': {}", program, e),
            Err(_) => tracing::warn!(
                "🔈 Volume command '{}' did not finish within {:?}",
                program,
                self.volume_timeout
            ),
            Ok(Ok(_)) => {}
        }
    }

    async fn play(&self, cue: Cue) {
        let asset = self.asset(cue);
        if !asset.exists() {
            tracing::warn!("🔇 Sound file does not exist: {}", asset.display());
            return;
        }

        self.set_volume().await;

        let spawned = Command::new(&self.player)
            .args(&self.player_args)
            .arg(asset)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => tracing::warn!(
                "🔇 Could not start player '{}' for {}: {}",
                self.player,
                asset.display(),
                e
            ),
        }
    }
}

#[async_trait]
impl Feedback for SoundFeedback {
    async fn notify_success(&self) {
        self.play(Cue::Success).await;
    }

    async fn notify_failure(&self) {
        self.play(Cue::Failure).await;
    }
}

/// Logs cues instead of playing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

#[async_trait]
impl Feedback for LogFeedback {
    async fn notify_success(&self) {
        tracing::info!("🔔 success cue");
    }

    async fn notify_failure(&self) {
        tracing::info!("🔔 failure cue");
    }
}
