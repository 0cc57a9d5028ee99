//! GIF89a container writing.
//!
//! [`GifEncoder`] turns raw RGB frames into a GIF89a byte stream: NeuQuant
//! builds a 256-color palette per frame, pixels are mapped to indices, and
//! the indexed stream is LZW-compressed into sub-blocks. [`GifWriter`] wraps
//! the encoder with frame-rate/repeat/disposal bookkeeping over any
//! `io::Write` sink.

use std::io::Write;

use log::{debug, trace};

use crate::color::Rgb;
use crate::error::GifError;
use crate::lzw::LzwEncoder;
use crate::neuquant::NeuQuant;

// Color table size field: log2(256) - 1
const PAL_SIZE: u8 = 7;
const COLOR_DEPTH: i32 = 8;

/// Frame disposal methods from the GIF specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispose {
    /// Nothing special.
    Nothing = 0,
    /// Retain the current image.
    Keep = 1,
    /// Restore the background color.
    RestoreBackground = 2,
    /// Remove the current image, restoring whatever was beneath it.
    Remove = 3,
}

/// Encodes a GIF file consisting of one or more frames.
///
/// Every frame gets its own NeuQuant palette: the first frame's becomes the
/// global color table, later frames carry local tables.
pub struct GifEncoder {
    width: u16,
    height: u16,
    transparent: Option<Rgb>,
    repeat: i32,
    delay: u16,
    dispose: Option<Dispose>,
    sample: usize,
    started: bool,
    used_entry: [bool; 256],
}

impl GifEncoder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            transparent: None,
            repeat: -1,
            delay: 0,
            dispose: None,
            sample: 10,
            started: false,
            used_entry: [false; 256],
        }
    }

    /// Color to be treated as transparent on display. The quantized palette
    /// entry closest to it becomes the transparent index of each frame.
    pub fn transparent(mut self, color: Option<Rgb>) -> Self {
        self.transparent = color;
        self
    }

    /// Number of times the frame set should repeat; 0 plays indefinitely,
    /// negative suppresses the Netscape loop extension entirely.
    pub fn repeat(mut self, repeat: i32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Inter-frame delay in hundredths of a second.
    pub fn delay(mut self, delay: u16) -> Self {
        self.delay = delay;
        self
    }

    /// Frame disposal override; without it, disposal is derived from
    /// transparency (restore-background when a transparent color is set).
    pub fn dispose(mut self, dispose: Option<Dispose>) -> Self {
        self.dispose = dispose;
        self
    }

    /// NeuQuant sampling factor, 1..=30. Lower samples more pixels and
    /// produces better palettes at a cost in speed.
    pub fn sample(mut self, sample: usize) -> Self {
        self.sample = sample.max(1);
        self
    }

    /// Write the GIF89a header. Must be called before any frame.
    pub fn start<W: Write>(&mut self, outs: &mut W) -> Result<(), GifError> {
        outs.write_all(b"GIF89a")?;
        self.started = true;
        Ok(())
    }

    /// Quantize and write one frame of packed RGB bytes (3 per pixel).
    pub fn write_frame<W: Write>(
        &mut self,
        outs: &mut W,
        pixels: &[u8],
        first_frame: bool,
    ) -> Result<(), GifError> {
        if !self.started {
            return Err(GifError::NotStarted);
        }

        let mut indexed = vec![0u8; pixels.len() / 3];
        let color_tab = self.analyze_pixels(pixels, &mut indexed);
        let trans_index = match self.transparent {
            Some(color) => find_closest(&color_tab, &self.used_entry, color),
            None => 0,
        };

        if first_frame {
            self.write_lsd(outs)?;
            write_palette(outs, &color_tab)?;
            if self.repeat >= 0 {
                self.write_netscape_ext(outs)?;
            }
        }
        self.write_graphic_ctrl_ext(outs, trans_index)?;
        self.write_image_desc(outs, first_frame)?;
        if !first_frame {
            // The global table belongs to the first frame; every other
            // frame carries its own local table
            write_palette(outs, &color_tab)?;
        }
        self.write_pixels(outs, &indexed)?;
        Ok(())
    }

    /// Write the trailer and flush. The sink itself stays open.
    pub fn stop<W: Write>(&mut self, outs: &mut W) -> Result<(), GifError> {
        if !self.started {
            return Err(GifError::NotStarted);
        }
        self.started = false;
        outs.write_all(&[0x3b])?;
        outs.flush()?;
        Ok(())
    }

    /// Build the frame's color table and map its pixels to palette indices.
    fn analyze_pixels(&mut self, pixels: &[u8], indexed: &mut [u8]) -> [u8; 768] {
        let mut nq = NeuQuant::new(pixels, self.sample);
        let mut color_tab = nq.process();

        // The network map comes out BGR; flip to RGB
        for i in (0..color_tab.len()).step_by(3) {
            color_tab.swap(i, i + 2);
            self.used_entry[i / 3] = false;
        }

        let mut k = 0;
        for target in indexed.iter_mut() {
            let index = nq.map(
                i32::from(pixels[k]),
                i32::from(pixels[k + 1]),
                i32::from(pixels[k + 2]),
            );
            k += 3;
            self.used_entry[index] = true;
            *target = index as u8;
        }
        color_tab
    }

    /// Logical Screen Descriptor.
    fn write_lsd<W: Write>(&self, outs: &mut W) -> Result<(), GifError> {
        write_short(outs, self.width)?;
        write_short(outs, self.height)?;
        // global color table flag, color resolution 7, sort flag 0, size
        outs.write_all(&[0x80 | 0x70 | PAL_SIZE, 0, 0])?;
        Ok(())
    }

    /// Graphic Control Extension.
    fn write_graphic_ctrl_ext<W: Write>(
        &self,
        outs: &mut W,
        trans_index: usize,
    ) -> Result<(), GifError> {
        outs.write_all(&[0x21, 0xf9, 4])?;
        let (transp, mut disp) = if self.transparent.is_none() {
            (0u8, 0u8)
        } else {
            // force restore-background when a transparent color is in play
            (1, 2)
        };
        if let Some(dispose) = self.dispose {
            disp = dispose as u8 & 7;
        }
        outs.write_all(&[(disp << 2) | transp])?;
        write_short(outs, self.delay)?;
        outs.write_all(&[trans_index as u8, 0])?;
        Ok(())
    }

    /// Image Descriptor.
    fn write_image_desc<W: Write>(&self, outs: &mut W, first_frame: bool) -> Result<(), GifError> {
        outs.write_all(&[0x2c])?;
        write_short(outs, 0)?; // position x, y = 0, 0
        write_short(outs, 0)?;
        write_short(outs, self.width)?;
        write_short(outs, self.height)?;
        if first_frame {
            // no LCT - the GCT covers the first (or only) frame
            outs.write_all(&[0])?;
        } else {
            outs.write_all(&[0x80 | PAL_SIZE])?;
        }
        Ok(())
    }

    /// Netscape 2.0 application extension carrying the loop count.
    fn write_netscape_ext<W: Write>(&self, outs: &mut W) -> Result<(), GifError> {
        outs.write_all(&[0x21, 0xff, 11])?;
        outs.write_all(b"NETSCAPE2.0")?;
        outs.write_all(&[3, 1])?;
        write_short(outs, self.repeat as u16)?; // extra iterations, 0 = forever
        outs.write_all(&[0])?;
        Ok(())
    }

    fn write_pixels<W: Write>(&self, outs: &mut W, indexed: &[u8]) -> Result<(), GifError> {
        let mut encoder = LzwEncoder::new(
            usize::from(self.width),
            usize::from(self.height),
            indexed,
            COLOR_DEPTH,
        );
        encoder.encode(outs)?;
        Ok(())
    }
}

/// Index of the used palette entry closest to `color`.
fn find_closest(color_tab: &[u8; 768], used_entry: &[bool; 256], color: Rgb) -> usize {
    let r = (color.r * 255.0) as i32;
    let g = (color.g * 255.0) as i32;
    let b = (color.b * 255.0) as i32;
    let mut minpos = 0;
    let mut dmin = 256 * 256 * 256;
    for (index, used) in used_entry.iter().enumerate() {
        let dr = r - i32::from(color_tab[index * 3]);
        let dg = g - i32::from(color_tab[index * 3 + 1]);
        let db = b - i32::from(color_tab[index * 3 + 2]);
        let d = dr * dr + dg * dg + db * db;
        if *used && d < dmin {
            dmin = d;
            minpos = index;
        }
    }
    minpos
}

fn write_palette<W: Write>(outs: &mut W, color_tab: &[u8; 768]) -> Result<(), GifError> {
    outs.write_all(color_tab)?;
    Ok(())
}

/// Write a 16-bit value LSB first.
fn write_short<W: Write>(outs: &mut W, value: u16) -> Result<(), GifError> {
    outs.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Animated-GIF writing over an owned sink, with frame pacing and repeat
/// configuration. Frames are full-size packed RGB buffers.
pub struct GifWriter<W: Write> {
    width: u16,
    height: u16,
    transparent: Option<Rgb>,
    repeat: i32,
    delay: u16,
    dispose: Option<Dispose>,
    sample: usize,
    stream: Option<W>,
    encoder: Option<GifEncoder>,
    first_frame: bool,
}

impl<W: Write> GifWriter<W> {
    pub fn new() -> Self {
        Self {
            width: 320,
            height: 240,
            transparent: None,
            repeat: -1,
            delay: 0,
            dispose: None,
            sample: 10,
            stream: None,
            encoder: None,
            first_frame: true,
        }
    }

    /// Output size in pixels. Both dimensions must be even and nonzero;
    /// validated when the writer starts.
    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Color to be treated as transparent on display.
    pub fn transparent_color(mut self, color: Option<Rgb>) -> Self {
        self.transparent = color;
        self
    }

    /// Number of times the frame set should be played; 0 means
    /// indefinitely. Negative (the default) writes no loop extension.
    pub fn repeat(mut self, repeat: i32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Delay between frames in milliseconds (stored in 1/100 s units).
    pub fn delay_ms(mut self, delay: u32) -> Self {
        self.delay = (f64::from(delay) / 10.0).round() as u16;
        self
    }

    /// Frame rate in frames per second. Equivalent to `delay_ms(1000/fps)`.
    pub fn frame_rate(mut self, fps: f64) -> Self {
        if fps > 0.0 {
            self.delay = (100.0 / fps).round() as u16;
        }
        self
    }

    /// Disposal mode applied to every frame.
    pub fn dispose(mut self, dispose: Dispose) -> Self {
        self.dispose = Some(dispose);
        self
    }

    /// Quantization quality: 1 is best and slowest, 10 the default; values
    /// above 20 stop yielding meaningful speedups. Clamped to at least 1.
    pub fn quality(mut self, quality: usize) -> Self {
        self.sample = quality.max(1);
        self
    }

    /// Begin writing to `stream`.
    pub fn start(&mut self, stream: W) -> Result<(), GifError> {
        if self.stream.is_some() {
            return Err(GifError::AlreadyStarted);
        }
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(GifError::OddDimension {
                width: self.width,
                height: self.height,
            });
        }
        debug!(
            "starting gif writer with {}x{} output",
            self.width, self.height
        );

        let mut encoder = GifEncoder::new(self.width, self.height)
            .transparent(self.transparent)
            .repeat(self.repeat)
            .delay(self.delay)
            .dispose(self.dispose)
            .sample(self.sample);
        let mut stream = stream;
        encoder.start(&mut stream)?;

        self.encoder = Some(encoder);
        self.stream = Some(stream);
        self.first_frame = true;
        Ok(())
    }

    /// Write one frame of RGB pixels. The buffer must hold exactly
    /// `width * height` pixels.
    pub fn frame(&mut self, pixels: &[rgb::RGB<u8>]) -> Result<(), GifError> {
        let (Some(encoder), Some(stream)) = (self.encoder.as_mut(), self.stream.as_mut()) else {
            return Err(GifError::NotStarted);
        };
        let expected = usize::from(self.width) * usize::from(self.height);
        if pixels.len() != expected {
            return Err(GifError::FrameSizeMismatch {
                len: pixels.len(),
                width: self.width,
                height: self.height,
            });
        }

        trace!("writing frame (first: {})", self.first_frame);
        let bytes: Vec<u8> = pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect();
        encoder.write_frame(stream, &bytes, self.first_frame)?;
        self.first_frame = false;
        Ok(())
    }

    /// Write the trailer and hand the sink back.
    pub fn finish(&mut self) -> Result<W, GifError> {
        let (Some(mut encoder), Some(mut stream)) = (self.encoder.take(), self.stream.take())
        else {
            return Err(GifError::NotStarted);
        };
        encoder.stop(&mut stream)?;
        debug!("gif stream closed");
        Ok(stream)
    }
}

impl<W: Write> Default for GifWriter<W> {
    fn default() -> Self {
        Self::new()
    }
}
