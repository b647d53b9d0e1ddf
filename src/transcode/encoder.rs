//! ffmpeg-backed subtitle encoder
//!
//! Runs `ffmpeg` once per request and collects the converted output in
//! memory, so failures are known before any response bytes are sent.

use async_trait::async_trait;
use bytes::Bytes;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use super::json::srt_to_json;
use crate::config::EncoderConfig;
use crate::error::{Result, SubtitleError};
use crate::library::{ByteStream, EncodeRequest, Item, MediaSourceProvider, SubtitleEncoder};
use crate::ticks::ticks_to_ffmpeg_time;

/// Bytes of stderr kept in error messages
const STDERR_TAIL: usize = 512;

/// Subtitle codec and muxer ffmpeg should use for a format.
pub fn codec_for_format(format: &str) -> Result<(&'static str, &'static str)> {
    match format {
        "vtt" => Ok(("webvtt", "webvtt")),
        "srt" | "json" => Ok(("srt", "srt")),
        "ass" | "ssa" => Ok(("ass", "ass")),
        "ttml" => Ok(("ttml", "ttml")),
        other => Err(SubtitleError::validation(format!(
            "unsupported subtitle format: {}",
            other
        ))),
    }
}

/// Build the ffmpeg arguments for one conversion.
pub fn build_args(input: &Path, map: &str, request: &EncodeRequest) -> Result<Vec<OsString>> {
    let (codec, muxer) = codec_for_format(&request.format)?;

    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-nostdin"]
        .iter()
        .map(OsString::from)
        .collect();

    // Input seek
    if request.start_ticks > 0 {
        args.push("-ss".into());
        args.push(ticks_to_ffmpeg_time(request.start_ticks).into());
    }
    args.push("-i".into());
    args.push(input.as_os_str().to_owned());

    if request.copy_timestamps {
        args.push("-copyts".into());
    }
    if let Some(duration) = request
        .end_ticks
        .checked_sub(request.start_ticks)
        .filter(|d| *d > 0)
    {
        args.push("-t".into());
        args.push(ticks_to_ffmpeg_time(duration).into());
    }

    args.push("-map".into());
    args.push(map.into());
    args.push("-c:s".into());
    args.push(codec.into());
    args.push("-f".into());
    args.push(muxer.into());
    args.push("pipe:1".into());

    Ok(args)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL)
        .map(|(i, _)| i)
        .unwrap_or(0);
    text[start..].to_string()
}

/// Encoder that shells out to the ffmpeg binary.
pub struct FfmpegSubtitleEncoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
    sources: Arc<dyn MediaSourceProvider>,
}

impl FfmpegSubtitleEncoder {
    pub fn new(config: &EncoderConfig, sources: Arc<dyn MediaSourceProvider>) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            sources,
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running {:?} {:?}", self.ffmpeg_path, args);

        let child = cmd.spawn().map_err(|e| {
            SubtitleError::Encoding(format!(
                "failed to spawn {}: {}",
                self.ffmpeg_path.display(),
                e
            ))
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SubtitleError::Encoding(format!("ffmpeg timed out after {:?}", self.timeout))
            })??;

        if !output.status.success() {
            return Err(SubtitleError::Encoding(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl SubtitleEncoder for FfmpegSubtitleEncoder {
    async fn get_subtitles(&self, item: &Item, request: &EncodeRequest) -> Result<ByteStream> {
        let source = self
            .sources
            .get_media_source(item, &request.stream.media_source_id)
            .await?;
        let stream = source.subtitle_stream(request.stream.stream_index).ok_or_else(|| {
            SubtitleError::not_found(format!(
                "subtitle stream {} of media source {}",
                request.stream.stream_index, source.id
            ))
        })?;

        let (input, map) = match (&stream.path, stream.is_external) {
            (Some(path), true) => (path.clone(), "0:0".to_string()),
            _ => (source.path.clone(), format!("0:{}", stream.index)),
        };

        let args = build_args(&input, &map, request)?;
        let stdout = self.run(args).await?;

        let body = if request.format == "json" {
            srt_to_json(&String::from_utf8_lossy(&stdout))?.into_bytes()
        } else {
            stdout
        };

        tracing::debug!(
            "Encoded subtitle stream {} of {} to {} ({} bytes)",
            stream.index,
            item.id,
            request.format,
            body.len()
        );

        Ok(Box::pin(futures::stream::once(async move {
            Ok::<_, std::io::Error>(Bytes::from(body))
        })))
    }
}
