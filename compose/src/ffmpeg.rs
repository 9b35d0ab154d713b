use crate::{
    AMBIENT_GAIN, ByteStream, Composition, CompositionInput, ComposeError, MUSIC_GAIN,
    MediaComposer, ScratchDir, VOICEOVER_GAIN,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Shells out to the system `ffmpeg` binary. The binary name is
/// configurable so tests can point at a stub script instead of a real
/// install.
pub struct FfmpegComposer {
    binary: String,
}

impl Default for FfmpegComposer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegComposer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[String]) -> Result<(), ComposeError> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ComposeError::Transcode(format!("spawn {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ComposeError::Transcode(format!(
                "{} exited with {}: {stderr}",
                self.binary, output.status
            )));
        }
        Ok(())
    }
}

async fn write_stream_to_file(path: &Path, mut stream: ByteStream) -> Result<(), ComposeError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ComposeError::Io(format!("create {}: {e}", path.display())))?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ComposeError::Io(format!("write {}: {e}", path.display())))?;
    }
    file.flush()
        .await
        .map_err(|e| ComposeError::Io(format!("flush {}: {e}", path.display())))?;
    Ok(())
}

#[async_trait]
impl MediaComposer for FfmpegComposer {
    async fn begin_scratch(&self) -> Result<ScratchDir, ComposeError> {
        let dir = tempfile::Builder::new()
            .prefix("serenity-compose-")
            .tempdir()
            .map_err(|e| ComposeError::Scratch(e.to_string()))?;
        Ok(ScratchDir::new(dir))
    }

    async fn compose(
        &self,
        scratch: &ScratchDir,
        input: CompositionInput,
    ) -> Result<Composition, ComposeError> {
        let root = scratch.path();
        let video_in = root.join("video.mp4");
        let voiceover_in = root.join("voiceover.mp3");
        let ambient_in = root.join("ambient.mp3");
        let music_in = root.join("music.mp3");

        write_stream_to_file(&video_in, input.video_stream).await?;
        write_stream_to_file(&voiceover_in, input.voiceover_stream).await?;
        let has_ambient = if let Some(stream) = input.ambient_stream {
            write_stream_to_file(&ambient_in, stream).await?;
            true
        } else {
            false
        };
        let has_music = if let Some(stream) = input.music_stream {
            write_stream_to_file(&music_in, stream).await?;
            true
        } else {
            false
        };

        let out_path = root.join("final.mp4");
        let thumbnail_path = root.join("thumbnail.jpg");

        let mux_inputs = MuxInputs {
            video: &video_in,
            voiceover: &voiceover_in,
            ambient: has_ambient.then_some(ambient_in.as_path()),
            music: has_music.then_some(music_in.as_path()),
        };
        self.run(&mux_args(&mux_inputs, &out_path, input.requested_duration_seconds))
            .await?;

        self.run(&[
            "-y".to_string(),
            "-i".to_string(),
            out_path.to_string_lossy().into_owned(),
            "-ss".to_string(),
            "00:00:01".to_string(),
            "-vframes".to_string(),
            "1".to_string(),
            thumbnail_path.to_string_lossy().into_owned(),
        ])
        .await?;

        Ok(Composition {
            video_path: out_path,
            thumbnail_path,
            duration_seconds: input.requested_duration_seconds,
        })
    }
}

struct MuxInputs<'a> {
    video: &'a Path,
    voiceover: &'a Path,
    ambient: Option<&'a Path>,
    music: Option<&'a Path>,
}

/// Builds the ffmpeg argv for muxing the video against a gain-weighted mix
/// of voiceover, ambient, and music tracks.
fn mux_args(inputs: &MuxInputs<'_>, out: &Path, duration_seconds: u32) -> Vec<String> {
    let mut paths = vec![inputs.video, inputs.voiceover];
    if let Some(a) = inputs.ambient {
        paths.push(a);
    }
    if let Some(m) = inputs.music {
        paths.push(m);
    }

    let mut filter_stages = vec![format!("[1:a]volume={VOICEOVER_GAIN}[v1]")];
    let mut mix_labels = vec!["[v1]".to_string()];
    let mut next_index = 2;
    if inputs.ambient.is_some() {
        filter_stages.push(format!("[{next_index}:a]volume={AMBIENT_GAIN}[v{next_index}]"));
        mix_labels.push(format!("[v{next_index}]"));
        next_index += 1;
    }
    if inputs.music.is_some() {
        filter_stages.push(format!("[{next_index}:a]volume={MUSIC_GAIN}[v{next_index}]"));
        mix_labels.push(format!("[v{next_index}]"));
    }

    let filter = format!(
        "{};{}amix=inputs={}:duration=first[aout]",
        filter_stages.join(";"),
        mix_labels.join(""),
        mix_labels.len()
    );

    let mut args = vec!["-y".to_string()];
    for path in &paths {
        args.push("-i".to_string());
        args.push(path.to_string_lossy().into_owned());
    }
    args.push("-filter_complex".to_string());
    args.push(filter);
    args.push("-map".to_string());
    args.push("0:v".to_string());
    args.push("-map".to_string());
    args.push("[aout]".to_string());
    args.push("-t".to_string());
    args.push(duration_seconds.to_string());
    args.push("-c:v".to_string());
    args.push("copy".to_string());
    args.push("-c:a".to_string());
    args.push("aac".to_string());
    args.push(out.to_string_lossy().into_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_args_includes_ambient_and_music_filters() {
        let video = Path::new("video.mp4");
        let voiceover = Path::new("voiceover.mp3");
        let ambient = Path::new("ambient.mp3");
        let music = Path::new("music.mp3");
        let out = Path::new("final.mp4");

        let args = mux_args(
            &MuxInputs {
                video,
                voiceover,
                ambient: Some(ambient),
                music: Some(music),
            },
            out,
            60,
        );

        let filter = args
            .iter()
            .position(|a| a == "-filter_complex")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_default();
        assert!(filter.contains("amix=inputs=3"));
        assert!(filter.contains("volume=0.3"));
        assert!(filter.contains("volume=0.2"));
    }

    #[test]
    fn mux_args_without_optional_tracks_mixes_voiceover_only() {
        let video = Path::new("video.mp4");
        let voiceover = Path::new("voiceover.mp3");
        let out = Path::new("final.mp4");

        let args = mux_args(
            &MuxInputs {
                video,
                voiceover,
                ambient: None,
                music: None,
            },
            out,
            60,
        );

        let filter = args
            .iter()
            .position(|a| a == "-filter_complex")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_default();
        assert!(filter.contains("amix=inputs=1"));
    }
}
