//! Sequential video frame decoding.

use std::path::Path;

use image::DynamicImage;

/// Frames of one video, read one at a time in stream order
pub trait FrameSource {
    /// Next decoded frame, `None` once the stream is exhausted
    fn next_frame(&mut self) -> anyhow::Result<Option<DynamicImage>>;
}

/// Frames held in memory, mostly useful for tests and stills
pub struct VecFrameSource {
    frames: std::vec::IntoIter<DynamicImage>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<DynamicImage>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<DynamicImage>> {
        Ok(self.frames.next())
    }
}

/// Signature of the function used to open a video file
pub type FrameSourceOpener = fn(&Path) -> anyhow::Result<Box<dyn FrameSource>>;

/// Open a video with the compiled-in decoder
#[cfg(feature = "video")]
pub fn open_video(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(ffmpeg::FfmpegFrameSource::open(path)?))
}

#[cfg(not(feature = "video"))]
pub fn open_video(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "Cannot open video {}: built without the `video` feature",
        path.display()
    )
}

#[cfg(feature = "video")]
mod ffmpeg {
    use std::path::Path;
    use std::sync::Once;

    use anyhow::{Result, anyhow};
    use ffmpeg_next::format::Pixel;
    use ffmpeg_next::software::scaling;
    use ffmpeg_next::{Packet, codec, format, frame, media};
    use image::{DynamicImage, RgbImage};

    use super::FrameSource;

    static FFMPEG_INIT: Once = Once::new();

    fn init_ffmpeg() -> Result<()> {
        let mut init_result = Ok(());
        FFMPEG_INIT.call_once(|| {
            if let Err(e) = ffmpeg_next::init() {
                init_result = Err(anyhow!("FFmpeg initialization failed: {e}"));
                return;
            }
            // SAFETY: only changes the global log level
            unsafe {
                ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
            }
        });
        init_result
    }

    pub struct FfmpegFrameSource {
        input: format::context::Input,
        decoder: codec::decoder::Video,
        scaler: scaling::Context,
        stream_index: usize,
        eof: bool,
    }

    impl FfmpegFrameSource {
        pub fn open(path: &Path) -> Result<Self> {
            init_ffmpeg()?;

            let input = format::input(&path)
                .map_err(|e| anyhow!("Failed to open video {}: {e}", path.display()))?;
            let stream = input
                .streams()
                .best(media::Type::Video)
                .ok_or_else(|| anyhow!("No video stream in {}", path.display()))?;
            let stream_index = stream.index();

            let decoder = codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| anyhow!("Failed to create codec context: {e}"))?
                .decoder()
                .video()
                .map_err(|e| anyhow!("Failed to create video decoder: {e}"))?;

            let (width, height) = (decoder.width(), decoder.height());
            if width == 0 || height == 0 {
                anyhow::bail!("Invalid video dimensions: {width}x{height}");
            }

            let scaler = scaling::Context::get(
                decoder.format(),
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| anyhow!("Failed to create scaler: {e}"))?;

            Ok(Self {
                input,
                decoder,
                scaler,
                stream_index,
                eof: false,
            })
        }

        fn convert(&mut self, decoded: &frame::Video) -> Result<DynamicImage> {
            let mut rgb = frame::Video::empty();
            self.scaler
                .run(decoded, &mut rgb)
                .map_err(|e| anyhow!("Failed to scale frame: {e}"))?;

            let (width, height) = (rgb.width(), rgb.height());
            let stride = rgb.stride(0);
            let data = rgb.data(0);
            let row_len = width as usize * 3;

            let mut bytes = Vec::with_capacity(row_len * height as usize);
            for y in 0..height as usize {
                let start = y * stride;
                bytes.extend_from_slice(&data[start..start + row_len]);
            }

            RgbImage::from_raw(width, height, bytes)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| anyhow!("Decoded frame has unexpected size"))
        }
    }

    impl FrameSource for FfmpegFrameSource {
        fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
            loop {
                let mut decoded = frame::Video::empty();
                if self.decoder.receive_frame(&mut decoded).is_ok() {
                    return self.convert(&decoded).map(Some);
                }
                if self.eof {
                    return Ok(None);
                }

                let mut packet = Packet::empty();
                match packet.read(&mut self.input) {
                    Ok(()) => {
                        if packet.stream() == self.stream_index {
                            self.decoder
                                .send_packet(&packet)
                                .map_err(|e| anyhow!("Failed to send packet: {e}"))?;
                        }
                    }
                    Err(ffmpeg_next::Error::Eof) => {
                        self.decoder
                            .send_eof()
                            .map_err(|e| anyhow!("Failed to flush decoder: {e}"))?;
                        self.eof = true;
                    }
                    Err(e) => return Err(anyhow!("Failed to read packet: {e}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn vec_source_yields_in_order_then_ends() -> anyhow::Result<()> {
        let frames = vec![
            DynamicImage::ImageRgb8(RgbImage::new(1, 1)),
            DynamicImage::ImageRgb8(RgbImage::new(2, 2)),
        ];
        let mut source = VecFrameSource::new(frames);

        assert_eq!(source.next_frame()?.map(|f| f.width()), Some(1));
        assert_eq!(source.next_frame()?.map(|f| f.width()), Some(2));
        assert!(source.next_frame()?.is_none());
        Ok(())
    }

    #[cfg(not(feature = "video"))]
    #[test]
    fn open_without_decoder_fails() {
        assert!(open_video(Path::new("clip.mp4")).is_err());
    }
}
