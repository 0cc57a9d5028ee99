use huequant::gif::{GifEncoder, GifWriter};
use huequant::lzw::LzwEncoder;
use huequant::Rgb;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

/// Reference GIF-LZW decoder: initial-code-size byte, length-prefixed
/// sub-blocks, variable code widths up to 12 bits, clear/end codes.
fn decode_lzw(data: &[u8]) -> Vec<u8> {
    let min_code_size = usize::from(data[0]);
    let mut bytes = Vec::new();
    let mut pos = 1;
    loop {
        let len = usize::from(data[pos]);
        pos += 1;
        if len == 0 {
            break;
        }
        bytes.extend_from_slice(&data[pos..pos + len]);
        pos += len;
    }

    let clear = 1usize << min_code_size;
    let end = clear + 1;

    fn fresh_dict(clear: usize) -> Vec<Vec<u8>> {
        let mut dict: Vec<Vec<u8>> = (0..clear).map(|i| vec![i as u8]).collect();
        dict.push(Vec::new()); // clear code
        dict.push(Vec::new()); // end code
        dict
    }

    fn read_code(bytes: &[u8], bitpos: &mut usize, code_size: usize) -> Option<usize> {
        if *bitpos + code_size > bytes.len() * 8 {
            return None;
        }
        let mut code = 0usize;
        for b in 0..code_size {
            let idx = (*bitpos + b) / 8;
            let bit = (*bitpos + b) % 8;
            if bytes[idx] >> bit & 1 == 1 {
                code |= 1 << b;
            }
        }
        *bitpos += code_size;
        Some(code)
    }

    let mut dict = fresh_dict(clear);
    let mut code_size = min_code_size + 1;
    let mut bitpos = 0usize;
    let mut prev: Option<usize> = None;
    let mut out = Vec::new();

    while let Some(code) = read_code(&bytes, &mut bitpos, code_size) {
        if code == clear {
            dict = fresh_dict(clear);
            code_size = min_code_size + 1;
            prev = None;
            continue;
        }
        if code == end {
            break;
        }

        match prev {
            None => {
                out.extend_from_slice(&dict[code]);
                prev = Some(code);
            }
            Some(p) => {
                let entry = if code < dict.len() {
                    dict[code].clone()
                } else {
                    // code not yet in the table: previous string + its head
                    let mut e = dict[p].clone();
                    e.push(dict[p][0]);
                    e
                };
                out.extend_from_slice(&entry);

                let mut new_entry = dict[p].clone();
                new_entry.push(entry[0]);
                dict.push(new_entry);
                if dict.len() == (1 << code_size) && code_size < 12 {
                    code_size += 1;
                }
                prev = Some(code);
            }
        }
    }
    out
}

fn encode_indices(width: usize, height: usize, indices: &[u8], depth: i32) -> Vec<u8> {
    let mut encoder = LzwEncoder::new(width, height, indices, depth);
    let mut out = Vec::new();
    encoder.encode(&mut out).unwrap();
    out
}

#[test]
fn lzw_round_trip_single_byte() {
    let indices = [5u8];
    let encoded = encode_indices(1, 1, &indices, 4);
    assert_eq!(decode_lzw(&encoded), indices);
}

#[test]
fn lzw_round_trip_noise() {
    let mut rng = StdRng::seed_from_u64(41);
    let indices: Vec<u8> = (0..64 * 64).map(|_| rng.gen_range(0..16)).collect();
    let encoded = encode_indices(64, 64, &indices, 4);
    assert_eq!(decode_lzw(&encoded), indices);
}

#[test]
fn lzw_round_trip_runs() {
    // Long runs exercise growing string matches and code-width bumps
    let indices: Vec<u8> = (0..10_000).map(|i| ((i / 97) % 8) as u8).collect();
    let encoded = encode_indices(100, 100, &indices, 8);
    assert_eq!(decode_lzw(&encoded), indices);
}

#[test]
fn lzw_round_trip_through_table_reset() {
    // High-entropy 8-bit data overflows the 12-bit table and forces a
    // clear-code block reset mid-stream
    let mut rng = StdRng::seed_from_u64(43);
    let indices: Vec<u8> = (0..150 * 150).map(|_| rng.gen()).collect();
    let encoded = encode_indices(150, 150, &indices, 8);
    assert_eq!(decode_lzw(&encoded), indices);
}

#[test]
fn tiny_gif_header_and_trailer() {
    let mut writer: GifWriter<Vec<u8>> = GifWriter::new().size(2, 2);
    writer.start(Vec::new()).unwrap();
    let pixels = [
        rgb::RGB { r: 255, g: 0, b: 0 },
        rgb::RGB { r: 0, g: 255, b: 0 },
        rgb::RGB { r: 0, g: 0, b: 255 },
        rgb::RGB {
            r: 255,
            g: 255,
            b: 255,
        },
    ];
    writer.frame(&pixels).unwrap();
    let bytes = writer.finish().unwrap();

    assert_eq!(&bytes[..6], b"GIF89a");
    assert_eq!(*bytes.last().unwrap(), 0x3b);
}

#[test]
fn tiny_gif_block_layout() {
    let mut writer: GifWriter<Vec<u8>> = GifWriter::new().size(2, 2).frame_rate(50.0);
    writer.start(Vec::new()).unwrap();
    let pixels = vec![rgb::RGB { r: 10, g: 200, b: 40 }; 4];
    writer.frame(&pixels).unwrap();
    let bytes = writer.finish().unwrap();

    // Logical Screen Descriptor: size, packed (GCT, resolution 7, size 7),
    // background, aspect
    assert_eq!(&bytes[6..13], &[2, 0, 2, 0, 0xf7, 0, 0]);

    // Global color table: 256 RGB entries
    let gce = 13 + 768;
    assert_eq!(&bytes[gce..gce + 4], &[0x21, 0xf9, 4, 0]);
    assert_eq!(&bytes[gce + 4..gce + 6], &[2, 0]); // round(100/50) centiseconds
    assert_eq!(bytes[gce + 7], 0); // block terminator

    // Image descriptor at origin, full size, no local table on first frame
    let desc = gce + 8;
    assert_eq!(
        &bytes[desc..desc + 10],
        &[0x2c, 0, 0, 0, 0, 2, 0, 2, 0, 0]
    );

    // Pixel data decodes back to four identical indices
    let data = &bytes[desc + 10..bytes.len() - 1];
    let indices = decode_lzw(data);
    assert_eq!(indices.len(), 4);
    assert!(indices.iter().all(|&i| i == indices[0]));

    // The shared index resolves through the palette near the input color
    let idx = usize::from(indices[0]);
    let entry = &bytes[13 + idx * 3..13 + idx * 3 + 3];
    assert!(
        (i32::from(entry[0]) - 10).abs() <= 32
            && (i32::from(entry[1]) - 200).abs() <= 32
            && (i32::from(entry[2]) - 40).abs() <= 32,
        "palette entry too far from frame color: {entry:?}"
    );
}

#[test]
fn repeat_writes_netscape_extension() {
    let mut writer: GifWriter<Vec<u8>> = GifWriter::new().size(2, 2).repeat(0);
    writer.start(Vec::new()).unwrap();
    let pixels = vec![rgb::RGB { r: 1, g: 2, b: 3 }; 4];
    writer.frame(&pixels).unwrap();
    let bytes = writer.finish().unwrap();

    let marker = b"NETSCAPE2.0";
    assert!(
        bytes.windows(marker.len()).any(|w| w == marker),
        "loop extension missing"
    );
}

#[test]
fn transparency_sets_gce_flag_and_disposal() {
    let mut encoder = GifEncoder::new(2, 2).transparent(Some(Rgb::rgb(1.0, 0.0, 0.0)));
    let mut bytes = Vec::new();
    encoder.start(&mut bytes).unwrap();
    let pixels: Vec<u8> = [[255u8, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]]
        .concat();
    encoder.write_frame(&mut bytes, &pixels, true).unwrap();
    encoder.stop(&mut bytes).unwrap();

    let gce = 13 + 768;
    // transparency flag set, disposal = restore background (2 << 2)
    assert_eq!(bytes[gce + 3], (2 << 2) | 1);
}

#[test]
fn second_frame_carries_local_color_table() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut writer: GifWriter<Vec<u8>> = GifWriter::new().size(2, 2);
    writer.start(Vec::new()).unwrap();
    let pixels = vec![rgb::RGB { r: 50, g: 60, b: 70 }; 4];
    writer.frame(&pixels).unwrap();
    writer.frame(&pixels).unwrap();
    let bytes = writer.finish().unwrap();

    // Walk to the second image descriptor and check its packed field
    let mut descriptors = Vec::new();
    let mut pos = 13 + 768; // past header, LSD, GCT
    while pos < bytes.len() - 1 {
        match bytes[pos] {
            0x21 => pos += 8, // GCE (fixed size here)
            0x2c => {
                descriptors.push(pos);
                let packed = bytes[pos + 9];
                pos += 10;
                if packed & 0x80 != 0 {
                    pos += 768; // local color table
                }
                // skip initial code size + sub-blocks
                pos += 1;
                while bytes[pos] != 0 {
                    pos += usize::from(bytes[pos]) + 1;
                }
                pos += 1;
            }
            other => panic!("unexpected block 0x{other:02x} at {pos}"),
        }
    }
    assert_eq!(descriptors.len(), 2);
    assert_eq!(bytes[descriptors[0] + 9] & 0x80, 0, "first frame uses GCT");
    assert_ne!(bytes[descriptors[1] + 9] & 0x80, 0, "second frame needs LCT");
}
