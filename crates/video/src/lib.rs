//! Video decode, annotate-encode, and transcode
//!
//! Decodes clips with `ffmpeg-next`, runs the landmark detector on each
//! RGB frame, draws overlays, and re-encodes. The final normalization
//! to H.264/AAC MP4 shells out to the `ffmpeg` binary, which handles
//! container and audio plumbing far more robustly than wiring it by
//! hand.

use athlete_common::VideoMeta;
use athlete_pose::{overlay, LandmarkDetector, LandmarkFrame, PoseError};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from decode, encode, and transcode paths
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Failed to open input: {0}")]
    Open(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("ffmpeg execution failed: {0}")]
    Transcode(String),

    #[error("Landmark detection failed: {0}")]
    Detector(#[from] PoseError),
}

/// Codec seam used by the pipeline. Implementations are synchronous;
/// callers run them under a blocking task.
pub trait VideoCodec: Send + Sync {
    /// Read stream metadata without decoding frames
    fn probe(&self, input: &Path) -> Result<VideoMeta, VideoError>;

    /// Decode every frame, detect landmarks, draw overlays, and encode
    /// the annotated frames to `output`. Returns the actual decoded
    /// shape and the per-frame landmark series (one entry per frame,
    /// `None` where no person was detected).
    fn annotate(
        &self,
        input: &Path,
        output: &Path,
        detector: &dyn LandmarkDetector,
    ) -> Result<(VideoMeta, Vec<Option<LandmarkFrame>>), VideoError>;

    /// Decode up to `max_frames` frames and collect the landmark series
    /// without producing any output video
    fn sample_landmarks(
        &self,
        input: &Path,
        detector: &dyn LandmarkDetector,
        max_frames: usize,
    ) -> Result<Vec<Option<LandmarkFrame>>, VideoError>;

    /// Normalize a clip to H.264/AAC MP4
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), VideoError>;
}

/// Initialize `FFmpeg` library
fn init_ffmpeg() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        ffmpeg::init().expect("Failed to initialize FFmpeg");
    });
}

/// `VideoCodec` implementation backed by ffmpeg-next and the `ffmpeg`
/// binary for the final transcode
#[derive(Debug, Default)]
pub struct FfmpegCodec;

impl FfmpegCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode `input` as RGB24 and hand each frame to `visit`; stop
    /// early when `visit` returns false
    fn decode_frames<F>(input: &Path, mut visit: F) -> Result<VideoMeta, VideoError>
    where
        F: FnMut(u64, &mut RgbImage) -> Result<bool, VideoError>,
    {
        init_ffmpeg();

        let mut ictx = ffmpeg::format::input(&input)
            .map_err(|e| VideoError::Open(format!("Failed to open input file: {e}")))?;

        let video_stream = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;

        let stream_index = video_stream.index();
        let rate = video_stream.avg_frame_rate();
        let fps = if rate.1 > 0 {
            f64::from(rate.0) / f64::from(rate.1)
        } else {
            30.0
        };

        let codec_params = video_stream.parameters();
        let mut decoder = ffmpeg::codec::context::Context::from_parameters(codec_params)
            .map_err(|e| VideoError::Decode(format!("Failed to create context: {e}")))?
            .decoder()
            .video()
            .map_err(|e| VideoError::Decode(format!("Failed to create decoder: {e}")))?;

        let width = decoder.width();
        let height = decoder.height();
        let src_format = decoder.format();

        let mut scaler = ffmpeg::software::scaling::Context::get(
            src_format,
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::Decode(format!("Failed to create scaler: {e}")))?;

        let mut frame_number = 0u64;
        let mut stopped = false;
        let mut decoded_frame = ffmpeg::util::frame::video::Video::empty();
        let mut converted_frame = ffmpeg::util::frame::video::Video::empty();

        let mut drain = |decoder: &mut ffmpeg::decoder::Video,
                         frame_number: &mut u64,
                         stopped: &mut bool|
         -> Result<(), VideoError> {
            while !*stopped && decoder.receive_frame(&mut decoded_frame).is_ok() {
                scaler
                    .run(&decoded_frame, &mut converted_frame)
                    .map_err(|e| VideoError::Decode(format!("Failed to convert frame: {e}")))?;

                let mut rgb = frame_to_rgb_image(&converted_frame)
                    .ok_or_else(|| VideoError::Decode("RGB frame buffer mismatch".to_string()))?;

                if !visit(*frame_number, &mut rgb)? {
                    *stopped = true;
                }
                *frame_number += 1;
            }
            Ok(())
        };

        for (stream, packet) in ictx.packets() {
            if stopped {
                break;
            }
            if stream.index() != stream_index {
                continue;
            }
            if decoder.send_packet(&packet).is_ok() {
                drain(&mut decoder, &mut frame_number, &mut stopped)?;
            }
        }

        if !stopped {
            decoder.send_eof().ok();
            drain(&mut decoder, &mut frame_number, &mut stopped)?;
        }

        Ok(VideoMeta {
            width,
            height,
            fps,
            frame_count: frame_number,
        })
    }
}

/// Copy an RGB24 frame into an owned image, honoring the row stride
fn frame_to_rgb_image(frame: &ffmpeg::util::frame::video::Video) -> Option<RgbImage> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let stride = frame.stride(0);
    let plane_data = frame.data(0);

    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + (width * 3);
        data.extend_from_slice(plane_data.get(row_start..row_end)?);
    }

    RgbImage::from_raw(frame.width(), frame.height(), data)
}

/// Incremental encoder for annotated frames. Frames arrive as RGB and
/// are scaled to YUV420P before encoding; the intermediate codec is
/// MPEG-4 part 2, which every ffmpeg build carries — the transcode
/// stage produces the final H.264 artifact.
struct FrameEncoder {
    octx: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::video::Encoder,
    scaler: ffmpeg::software::scaling::Context,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    frame_index: i64,
}

impl FrameEncoder {
    fn new(output: &Path, width: u32, height: u32, fps: f64) -> Result<Self, VideoError> {
        init_ffmpeg();

        let mut octx = ffmpeg::format::output(&output)
            .map_err(|e| VideoError::Encode(format!("Failed to open output: {e}")))?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg::format::flag::Flags::GLOBAL_HEADER);

        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4)
            .ok_or_else(|| VideoError::Encode("MPEG4 encoder unavailable".to_string()))?;

        let mut ost = octx
            .add_stream(codec)
            .map_err(|e| VideoError::Encode(format!("Failed to add stream: {e}")))?;

        let fps_num = (fps.max(1.0) * 1000.0).round() as i32;
        let time_base = ffmpeg::Rational(1000, fps_num);

        let mut enc = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| VideoError::Encode(format!("Failed to create encoder: {e}")))?;

        enc.set_width(width);
        enc.set_height(height);
        enc.set_format(ffmpeg::format::Pixel::YUV420P);
        enc.set_time_base(time_base);
        enc.set_frame_rate(Some(ffmpeg::Rational(fps_num, 1000)));
        if global_header {
            enc.set_flags(ffmpeg::codec::flag::Flags::GLOBAL_HEADER);
        }

        let encoder = enc
            .open_as(codec)
            .map_err(|e| VideoError::Encode(format!("Failed to open encoder: {e}")))?;

        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);

        octx.write_header()
            .map_err(|e| VideoError::Encode(format!("Failed to write header: {e}")))?;

        // The muxer may rewrite the stream time base during write_header
        let stream_time_base = octx
            .stream(0)
            .map(|s| s.time_base())
            .unwrap_or(time_base);

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::Encode(format!("Failed to create scaler: {e}")))?;

        Ok(Self {
            octx,
            encoder,
            scaler,
            encoder_time_base: time_base,
            stream_time_base,
            frame_index: 0,
        })
    }

    fn push(&mut self, image: &RgbImage) -> Result<(), VideoError> {
        let width = image.width();
        let height = image.height();

        let mut rgb_frame =
            ffmpeg::util::frame::video::Video::new(ffmpeg::format::Pixel::RGB24, width, height);
        let stride = rgb_frame.stride(0);
        let row_len = width as usize * 3;
        let raw = image.as_raw();
        {
            let plane = rgb_frame.data_mut(0);
            for y in 0..height as usize {
                plane[y * stride..y * stride + row_len]
                    .copy_from_slice(&raw[y * row_len..(y + 1) * row_len]);
            }
        }

        let mut yuv_frame =
            ffmpeg::util::frame::video::Video::new(ffmpeg::format::Pixel::YUV420P, width, height);
        self.scaler
            .run(&rgb_frame, &mut yuv_frame)
            .map_err(|e| VideoError::Encode(format!("Failed to convert frame: {e}")))?;

        yuv_frame.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder
            .send_frame(&yuv_frame)
            .map_err(|e| VideoError::Encode(format!("Failed to send frame: {e}")))?;

        self.write_packets()
    }

    fn write_packets(&mut self) -> Result<(), VideoError> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.octx)
                .map_err(|e| VideoError::Encode(format!("Failed to write packet: {e}")))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), VideoError> {
        self.encoder
            .send_eof()
            .map_err(|e| VideoError::Encode(format!("Failed to flush encoder: {e}")))?;
        self.write_packets()?;
        self.octx
            .write_trailer()
            .map_err(|e| VideoError::Encode(format!("Failed to write trailer: {e}")))?;
        Ok(())
    }
}

impl VideoCodec for FfmpegCodec {
    fn probe(&self, input: &Path) -> Result<VideoMeta, VideoError> {
        init_ffmpeg();

        let ictx = ffmpeg::format::input(&input)
            .map_err(|e| VideoError::Open(format!("Failed to open input file: {e}")))?;

        let video_stream = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;

        let rate = video_stream.avg_frame_rate();
        let fps = if rate.1 > 0 {
            f64::from(rate.0) / f64::from(rate.1)
        } else {
            30.0
        };

        let frames = video_stream.frames();
        let frame_count = if frames > 0 {
            frames as u64
        } else {
            // Some containers omit the frame count; estimate from duration
            let tb = video_stream.time_base();
            let duration = video_stream.duration() as f64 * f64::from(tb.0) / f64::from(tb.1);
            (duration * fps).max(0.0).round() as u64
        };

        let decoder = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())
            .map_err(|e| VideoError::Decode(format!("Failed to create context: {e}")))?
            .decoder()
            .video()
            .map_err(|e| VideoError::Decode(format!("Failed to create decoder: {e}")))?;

        Ok(VideoMeta {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            frame_count,
        })
    }

    fn annotate(
        &self,
        input: &Path,
        output: &Path,
        detector: &dyn LandmarkDetector,
    ) -> Result<(VideoMeta, Vec<Option<LandmarkFrame>>), VideoError> {
        info!("Annotating {} -> {}", input.display(), output.display());

        let source = self.probe(input)?;
        let mut encoder = FrameEncoder::new(output, source.width, source.height, source.fps)?;
        let mut series: Vec<Option<LandmarkFrame>> = Vec::new();

        let meta = Self::decode_frames(input, |frame_number, rgb| {
            let detected = detector.detect(rgb)?;
            if let Some(frame) = &detected {
                overlay::draw_landmarks(rgb, frame);
            }
            series.push(detected);
            encoder.push(rgb)?;
            if frame_number % 100 == 0 {
                debug!("Annotated frame {}", frame_number);
            }
            Ok(true)
        })?;

        encoder.finish()?;

        info!(
            "Annotated {} frames, {} with landmarks",
            meta.frame_count,
            series.iter().filter(|f| f.is_some()).count()
        );

        Ok((meta, series))
    }

    fn sample_landmarks(
        &self,
        input: &Path,
        detector: &dyn LandmarkDetector,
        max_frames: usize,
    ) -> Result<Vec<Option<LandmarkFrame>>, VideoError> {
        let mut series: Vec<Option<LandmarkFrame>> = Vec::new();

        Self::decode_frames(input, |_, rgb| {
            series.push(detector.detect(rgb)?);
            Ok(series.len() < max_frames)
        })?;

        debug!("Sampled landmarks for {} frames", series.len());
        Ok(series)
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), VideoError> {
        debug!(
            "Transcoding {} to {}",
            input.display(),
            output.display()
        );

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-i"])
            .arg(input)
            .args(["-c:v", "libx264", "-preset", "medium", "-crf", "23"])
            .args(["-c:a", "aac", "-b:a", "128k"])
            .args(["-movflags", "+faststart"])
            .args(["-f", "mp4"])
            .arg(output);

        let out = cmd
            .output()
            .map_err(|e| VideoError::Transcode(format!("Failed to execute ffmpeg: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(VideoError::Transcode(format!("ffmpeg failed: {stderr}")));
        }

        Ok(())
    }
}
