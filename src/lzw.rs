//! GIF-variant LZW compression.
//!
//! Variable code width starting at `color_depth + 1` bits and capped at 12;
//! open-addressing double-hash string table with block reset once the table
//! fills; output packed into length-prefixed sub-blocks of at most 255
//! bytes, as the GIF89a stream expects.

use std::io::{self, Write};

const EOF: i32 = -1;
const BITS: i32 = 12;
const HSIZE: usize = 5003; // 80% occupancy

const MASKS: [i32; 17] = [
    0x0000, 0x0001, 0x0003, 0x0007, 0x000F, 0x001F, 0x003F, 0x007F, 0x00FF, 0x01FF, 0x03FF, 0x07FF,
    0x0FFF, 0x1FFF, 0x3FFF, 0x7FFF, 0xFFFF,
];

fn max_code(n_bits: i32) -> i32 {
    (1 << n_bits) - 1
}

pub struct LzwEncoder<'a> {
    pixels: &'a [u8],
    init_code_size: i32,
    remaining: usize,
    cur_pixel: usize,

    n_bits: i32,
    maxcode: i32,
    maxmaxcode: i32,
    htab: [i32; HSIZE],
    codetab: [i32; HSIZE],
    free_ent: i32,
    clear_flg: bool,
    g_init_bits: i32,
    clear_code: i32,
    eof_code: i32,

    // bit packer state
    cur_accum: i32,
    cur_bits: i32,

    // sub-block packet accumulator
    a_count: usize,
    accum: [u8; 256],
}

impl<'a> LzwEncoder<'a> {
    pub fn new(width: usize, height: usize, pixels: &'a [u8], color_depth: i32) -> Self {
        Self {
            pixels,
            init_code_size: color_depth.max(2),
            remaining: width * height,
            cur_pixel: 0,
            n_bits: 0,
            maxcode: 0,
            maxmaxcode: 1 << BITS,
            htab: [0; HSIZE],
            codetab: [0; HSIZE],
            free_ent: 0,
            clear_flg: false,
            g_init_bits: 0,
            clear_code: 0,
            eof_code: 0,
            cur_accum: 0,
            cur_bits: 0,
            a_count: 0,
            accum: [0; 256],
        }
    }

    /// Compress the pixel stream into `outs`: initial-code-size byte,
    /// sub-blocks, zero-length terminator.
    pub fn encode<W: Write>(&mut self, outs: &mut W) -> io::Result<()> {
        outs.write_all(&[self.init_code_size as u8])?;
        self.cur_pixel = 0;
        self.compress(self.init_code_size + 1, outs)?;
        outs.write_all(&[0])
    }

    fn next_pixel(&mut self) -> i32 {
        if self.remaining == 0 || self.cur_pixel >= self.pixels.len() {
            return EOF;
        }
        self.remaining -= 1;
        let pix = self.pixels[self.cur_pixel];
        self.cur_pixel += 1;
        i32::from(pix)
    }

    fn compress<W: Write>(&mut self, init_bits: i32, outs: &mut W) -> io::Result<()> {
        self.g_init_bits = init_bits;
        self.clear_flg = false;
        self.n_bits = init_bits;
        self.maxcode = max_code(self.n_bits);
        self.clear_code = 1 << (init_bits - 1);
        self.eof_code = self.clear_code + 1;
        self.free_ent = self.clear_code + 2;
        self.a_count = 0;

        let mut ent = self.next_pixel();

        // xor hashing shifts the char into the top of the table range
        let mut hshift = 0;
        let mut fcode = HSIZE as i32;
        while fcode < 65536 {
            hshift += 1;
            fcode *= 2;
        }
        hshift = 8 - hshift;
        let hsize_reg = HSIZE as i32;

        self.clear_table();
        self.output(self.clear_code, outs)?;

        'next_pixel: loop {
            let c = self.next_pixel();
            if c == EOF {
                break;
            }

            let fcode = (c << BITS) + ent;
            let mut i = (c << hshift) ^ ent;

            if self.htab[i as usize] == fcode {
                ent = self.codetab[i as usize];
                continue;
            }
            if self.htab[i as usize] >= 0 {
                // secondary hash (after G. Knott)
                let mut disp = hsize_reg - i;
                if i == 0 {
                    disp = 1;
                }
                loop {
                    i -= disp;
                    if i < 0 {
                        i += hsize_reg;
                    }
                    if self.htab[i as usize] == fcode {
                        ent = self.codetab[i as usize];
                        continue 'next_pixel;
                    }
                    if self.htab[i as usize] < 0 {
                        break;
                    }
                }
            }

            self.output(ent, outs)?;
            ent = c;
            if self.free_ent < self.maxmaxcode {
                self.codetab[i as usize] = self.free_ent;
                self.free_ent += 1;
                self.htab[i as usize] = fcode;
            } else {
                self.block_reset(outs)?;
            }
        }

        self.output(ent, outs)?;
        self.output(self.eof_code, outs)
    }

    /// Emit a clear code and reset the string table and code width.
    fn block_reset<W: Write>(&mut self, outs: &mut W) -> io::Result<()> {
        self.clear_table();
        self.free_ent = self.clear_code + 2;
        self.clear_flg = true;
        self.output(self.clear_code, outs)
    }

    fn clear_table(&mut self) {
        self.htab = [-1; HSIZE];
    }

    fn output<W: Write>(&mut self, code: i32, outs: &mut W) -> io::Result<()> {
        self.cur_accum &= MASKS[self.cur_bits as usize];
        if self.cur_bits > 0 {
            self.cur_accum |= code << self.cur_bits;
        } else {
            self.cur_accum = code;
        }
        self.cur_bits += self.n_bits;

        while self.cur_bits >= 8 {
            self.char_out((self.cur_accum & 0xff) as u8, outs)?;
            self.cur_accum >>= 8;
            self.cur_bits -= 8;
        }

        // If the next entry is too big for the current code width, grow it.
        // The width resets to the initial size right after a clear code.
        if self.free_ent > self.maxcode || self.clear_flg {
            if self.clear_flg {
                self.n_bits = self.g_init_bits;
                self.maxcode = max_code(self.n_bits);
                self.clear_flg = false;
            } else {
                self.n_bits += 1;
                self.maxcode = if self.n_bits == BITS {
                    self.maxmaxcode
                } else {
                    max_code(self.n_bits)
                };
            }
        }

        if code == self.eof_code {
            // Flush the rest of the packer buffer
            while self.cur_bits > 0 {
                self.char_out((self.cur_accum & 0xff) as u8, outs)?;
                self.cur_accum >>= 8;
                self.cur_bits -= 8;
            }
            self.flush_packet(outs)?;
        }
        Ok(())
    }

    fn char_out<W: Write>(&mut self, c: u8, outs: &mut W) -> io::Result<()> {
        self.accum[self.a_count] = c;
        self.a_count += 1;
        if self.a_count >= 254 {
            self.flush_packet(outs)?;
        }
        Ok(())
    }

    fn flush_packet<W: Write>(&mut self, outs: &mut W) -> io::Result<()> {
        if self.a_count > 0 {
            outs.write_all(&[self.a_count as u8])?;
            outs.write_all(&self.accum[..self.a_count])?;
            self.a_count = 0;
        }
        Ok(())
    }
}
