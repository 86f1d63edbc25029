//! Audio outputs backed by external programs.

use super::{AudioError, AudioOutput, Playback, SpeechFallback};
use lesson_core::Gender;
use std::io::Write;
use std::process::{Child, Command, Stdio};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Split a configured command line into program and leading arguments.
fn parse_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// A child process playing or speaking something.
pub struct ChildPlayback {
    child: Child,
    // Deleted when the playback is dropped.
    _file: Option<NamedTempFile>,
    stopped: bool,
}

impl Playback for ChildPlayback {
    fn is_playing(&mut self) -> bool {
        !self.stopped && matches!(self.child.try_wait(), Ok(None))
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

impl Drop for ChildPlayback {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Writes each payload to a temporary file and hands it to a player command.
pub struct CommandOutput {
    program: String,
    args: Vec<String>,
}

impl CommandOutput {
    /// `command` is e.g. `mpv --really-quiet`; the file path is appended.
    pub fn new(command: &str) -> Option<Self> {
        let (program, args) = parse_command(command)?;
        Some(Self { program, args })
    }
}

impl AudioOutput for CommandOutput {
    fn play(&self, audio: Vec<u8>) -> Result<Box<dyn Playback>, AudioError> {
        if audio.is_empty() {
            return Err(AudioError::Unavailable("empty audio payload".into()));
        }
        let mut file = tempfile::Builder::new()
            .prefix("hebrew-cue-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(&audio)?;
        file.flush()?;

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(player = %self.program, bytes = audio.len(), "playing audio cue");

        Ok(Box::new(ChildPlayback {
            child,
            _file: Some(file),
            stopped: false,
        }))
    }
}

/// On-device speech through a command such as `espeak-ng -v he`.
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(command: &str) -> Option<Self> {
        let (program, args) = parse_command(command)?;
        Some(Self { program, args })
    }
}

impl SpeechFallback for CommandSpeech {
    fn speak(&self, text: &str, gender: Gender) -> Result<Box<dyn Playback>, AudioError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(program = %self.program, %gender, "speaking with local fallback");

        Ok(Box::new(ChildPlayback {
            child,
            _file: None,
            stopped: false,
        }))
    }
}

/// Used when no player is configured: the payload is logged and dropped.
#[derive(Debug, Default)]
pub struct LogOnlyOutput;

struct Finished;

impl Playback for Finished {
    fn is_playing(&mut self) -> bool {
        false
    }

    fn stop(&mut self) {}
}

impl AudioOutput for LogOnlyOutput {
    fn play(&self, audio: Vec<u8>) -> Result<Box<dyn Playback>, AudioError> {
        info!(bytes = audio.len(), "no audio player configured, discarding cue");
        Ok(Box::new(Finished))
    }
}
