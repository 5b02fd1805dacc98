//! Raw frame decoding.
//!
//! Frames are pulled from an FFmpeg child process writing RGB24 rawvideo to
//! stdout. Only every Nth frame is emitted by FFmpeg itself (`select` filter),
//! so sampled frames never cross the pipe twice.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use reframe_models::Frame;

use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// A decoded frame tagged with its index in the unsampled sequence.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub index: u64,
    pub frame: Frame,
}

/// Ordered source of frames for one video.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream.
    async fn next_frame(&mut self) -> MediaResult<Option<SampledFrame>>;
}

/// Streams every `sample_interval`-th frame of a video through FFmpeg.
///
/// The child process is killed when the reader is dropped, so an early exit
/// from the frame loop never leaks a decoder.
pub struct FfmpegFrameReader {
    path: PathBuf,
    width: u32,
    height: u32,
    sample_interval: u64,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
    emitted: u64,
    finished: bool,
}

impl FfmpegFrameReader {
    /// Probe the video and start decoding.
    pub async fn open(path: impl AsRef<Path>, sample_interval: u64) -> MediaResult<Self> {
        let path = path.as_ref();
        let sample_interval = sample_interval.max(1);

        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;
        let info = probe_video(path).await?;

        info!(
            "[DECODE] Opening {} ({}x{} @ {:.2} fps, sampling every {} frames)",
            path.display(),
            info.width,
            info.height,
            info.fps,
            sample_interval
        );

        // rawvideo carries no timestamps, so FFmpeg never duplicates or drops
        // the frames `select` lets through.
        let select = format!("select=not(mod(n\\,{}))", sample_interval);
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:v:0",
                "-vf",
                select.as_str(),
                "-pix_fmt",
                "rgb24",
                "-f",
                "rawvideo",
                "-",
            ]);

        Self::spawn(cmd, path, &info, sample_interval)
    }

    /// Start `cmd`, which must write `info`-sized RGB24 frames to stdout.
    fn spawn(
        mut cmd: Command,
        path: &Path,
        info: &VideoInfo,
        sample_interval: u64,
    ) -> MediaResult<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| MediaError::ffmpeg_failed(format!("Failed to spawn FFmpeg: {}", e), None, None))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("Failed to capture FFmpeg stdout", None, None))?;

        // Drain stderr concurrently so a chatty decoder can't block on a full pipe.
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text).await;
                text
            })
        });

        Ok(Self {
            path: path.to_path_buf(),
            width: info.width,
            height: info.height,
            sample_interval,
            child,
            stdout: BufReader::with_capacity(1 << 20, stdout),
            stderr_task,
            emitted: 0,
            finished: false,
        })
    }

    /// Stop decoding and reap the child process.
    pub async fn close(mut self) {
        if !self.finished {
            if let Err(e) = self.child.kill().await {
                debug!("[DECODE] FFmpeg already exited: {}", e);
            }
        }
    }

    async fn finish(&mut self) -> MediaResult<()> {
        self.finished = true;
        let status = self.child.wait().await?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(MediaError::ffmpeg_failed(
                format!("FFmpeg failed to decode {}", self.path.display()),
                Some(stderr),
                status.code(),
            ));
        }

        if self.emitted == 0 {
            warn!("[DECODE] {} produced no frames", self.path.display());
        }

        info!(
            "[DECODE] Finished {}: {} sampled frames",
            self.path.display(),
            self.emitted
        );
        Ok(())
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameReader {
    async fn next_frame(&mut self) -> MediaResult<Option<SampledFrame>> {
        if self.finished {
            return Ok(None);
        }

        match read_frame(&mut self.stdout, self.width, self.height).await {
            Ok(Some(frame)) => {
                let index = self.emitted * self.sample_interval;
                self.emitted += 1;
                Ok(Some(SampledFrame { index, frame }))
            }
            Ok(None) => {
                self.finish().await?;
                Ok(None)
            }
            Err(e) => {
                warn!(
                    "[DECODE] Stopped reading {} after {} frames: {}",
                    self.path.display(),
                    self.emitted,
                    e
                );
                self.finished = true;
                Err(e)
            }
        }
    }
}

/// Read one RGB24 frame; `None` when the stream ends on a frame boundary.
async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    width: u32,
    height: u32,
) -> MediaResult<Option<Frame>> {
    let mut buffer = vec![0u8; Frame::byte_len(width, height)];
    match read_full(reader, &mut buffer).await? {
        0 => Ok(None),
        n if n < buffer.len() => Err(MediaError::invalid_video(format!(
            "Truncated frame ({} of {} bytes)",
            n,
            buffer.len()
        ))),
        _ => Ok(Some(Frame::new(width, height, buffer)?)),
    }
}

/// Fill `buf` unless the stream ends first; returns the bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// In-memory frame source, mostly for tests and callers that already hold
/// decoded frames.
pub struct VecFrameSource {
    frames: std::vec::IntoIter<SampledFrame>,
}

impl VecFrameSource {
    /// Frames are indexed by their position in `frames`.
    pub fn new(frames: Vec<Frame>) -> Self {
        let frames: Vec<SampledFrame> = frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| SampledFrame {
                index: i as u64,
                frame,
            })
            .collect();
        Self {
            frames: frames.into_iter(),
        }
    }
}

#[async_trait]
impl FrameSource for VecFrameSource {
    async fn next_frame(&mut self) -> MediaResult<Option<SampledFrame>> {
        Ok(self.frames.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_full_reports_short_reads() {
        let data = [1u8, 2, 3, 4, 5];
        let mut reader = &data[..];

        let mut buf = [0u8; 3];
        assert_eq!(read_full(&mut reader, &mut buf).await.unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);

        let mut buf = [0u8; 3];
        assert_eq!(read_full(&mut reader, &mut buf).await.unwrap(), 2);
        assert_eq!(read_full(&mut reader, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vec_source_indexes_frames_in_order() {
        let frames = (0..3).map(|_| Frame::black(2, 2).unwrap()).collect();
        let mut source = VecFrameSource::new(frames);

        let mut indices = Vec::new();
        while let Some(sampled) = source.next_frame().await.unwrap() {
            indices.push(sampled.index);
        }
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let result = FfmpegFrameReader::open("/definitely/not/here.mp4", 5).await;
        assert!(matches!(
            result,
            Err(MediaError::FileNotFound(_)) | Err(MediaError::FfmpegNotFound)
        ));
    }

    fn tiny_info() -> VideoInfo {
        VideoInfo {
            width: 1,
            height: 1,
            fps: 25.0,
            duration: 1.0,
            frame_count: None,
            codec: "rawvideo".to_string(),
        }
    }

    /// A reader fed by a shell script instead of FFmpeg.
    fn scripted_reader(script: &str, sample_interval: u64) -> FfmpegFrameReader {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        FfmpegFrameReader::spawn(cmd, Path::new("scripted.mp4"), &tiny_info(), sample_interval).unwrap()
    }

    #[tokio::test]
    async fn test_read_frame_splits_stream_into_frames() {
        let mut reader = tokio_test::io::Builder::new()
            .read(&[1, 2, 3, 4])
            .read(&[5, 6, 7, 8, 9, 10, 11, 12])
            .build();

        let first = read_frame(&mut reader, 2, 1).await.unwrap().unwrap();
        assert_eq!(first.data(), &[1, 2, 3, 4, 5, 6]);
        let second = read_frame(&mut reader, 2, 1).await.unwrap().unwrap();
        assert_eq!(second.data(), &[7, 8, 9, 10, 11, 12]);
        assert!(read_frame(&mut reader, 2, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frame_rejects_truncated_frame() {
        let mut reader = tokio_test::io::Builder::new().read(&[1, 2, 3, 4]).build();

        let result = read_frame(&mut reader, 2, 1).await;
        assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
    }

    #[tokio::test]
    async fn test_reader_keeps_unsampled_indices() {
        let mut reader = scripted_reader("printf abcdefghi", 5);

        let mut indices = Vec::new();
        while let Some(sampled) = reader.next_frame().await.unwrap() {
            indices.push(sampled.index);
        }
        assert_eq!(indices, vec![0, 5, 10]);
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_reports_truncated_output() {
        let mut reader = scripted_reader("printf abcd", 5);

        assert_eq!(reader.next_frame().await.unwrap().unwrap().index, 0);
        assert!(matches!(
            reader.next_frame().await,
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_surfaces_decoder_exit_code() {
        let mut reader = scripted_reader("echo 'moov atom not found' >&2; exit 3", 5);

        match reader.next_frame().await {
            Err(MediaError::FfmpegFailed {
                stderr, exit_code, ..
            }) => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.unwrap_or_default().contains("moov atom not found"));
            }
            other => panic!("expected FfmpegFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reader_with_no_output_ends_cleanly() {
        let mut reader = scripted_reader("exit 0", 5);
        assert!(reader.next_frame().await.unwrap().is_none());
    }
}
