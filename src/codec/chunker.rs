//! Block addressing over 2D byte planes.
//!
//! A [`Chunker`] partitions a plane of `width x height` pixels into
//! `ceil(width / size) x ceil(height / size)` square blocks in row-major order.
//! Each pixel occupies `elements` consecutive bytes and rows are `stride`
//! bytes apart, so the same type addresses both packed RGB bitmaps and
//! single-byte channel planes.
//!
//! Reads past the right or bottom edge produce zeros; writes past those edges
//! are dropped, leaving the destination untouched.

/// Block/pixel index mapping for one plane. Cheap to construct; build one per
/// plane and per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    width: usize,
    height: usize,
    stride: usize,
    elements: usize,
    blocks_wide: usize,
    blocks_high: usize,
}

impl Chunker {
    /// Create a chunker. `stride` is in bytes and is raised to at least
    /// `width * elements`.
    pub fn new(size: usize, width: usize, height: usize, stride: usize, elements: usize) -> Self {
        let size = size.max(1);
        let elements = elements.max(1);
        Self {
            size,
            width,
            height,
            stride: stride.max(width * elements),
            elements,
            blocks_wide: width.div_ceil(size),
            blocks_high: height.div_ceil(size),
        }
    }

    /// Chunker for a tightly packed single-byte plane.
    pub fn for_plane(size: usize, width: usize, height: usize) -> Self {
        Self::new(size, width, height, width, 1)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_high(&self) -> usize {
        self.blocks_high
    }

    pub fn block_count(&self) -> usize {
        self.blocks_wide * self.blocks_high
    }

    /// Number of bytes in one block: `size * size * elements`.
    pub fn block_len(&self) -> usize {
        self.size * self.size * self.elements
    }

    /// Byte index of the top-left pixel of block `block`.
    pub fn pixel_index(&self, block: usize) -> usize {
        let bx = block % self.blocks_wide.max(1);
        let by = block / self.blocks_wide.max(1);
        by * self.size * self.stride + bx * self.size * self.elements
    }

    /// Inverse of [`pixel_index`](Self::pixel_index): the block containing the
    /// pixel at byte index `pixel`, or `None` if it lies outside the plane.
    pub fn block_index(&self, pixel: usize) -> Option<usize> {
        let y = pixel / self.stride;
        let x = (pixel % self.stride) / self.elements;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y / self.size) * self.blocks_wide + x / self.size)
    }

    /// Byte offset of in-block position `(i, j)` of `block`, or `None` when that
    /// position falls outside the plane.
    fn source_offset(&self, block: usize, i: usize, j: usize) -> Option<usize> {
        let bx = block % self.blocks_wide.max(1);
        let by = block / self.blocks_wide.max(1);
        let x = bx * self.size + i;
        let y = by * self.size + j;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.stride + x * self.elements)
    }

    /// Copy block `block` out of `source`, zero-filling positions past the edge.
    pub fn get_block(&self, source: &[u8], block: usize) -> Vec<u8> {
        let mut out = vec![0u8; self.block_len()];
        self.read_block(source, block, &mut out);
        out
    }

    /// Like [`get_block`](Self::get_block) but into a caller-provided buffer of
    /// at least `block_len()` bytes.
    pub fn read_block(&self, source: &[u8], block: usize, dest: &mut [u8]) {
        let e = self.elements;
        for j in 0..self.size {
            for i in 0..self.size {
                let at = (j * self.size + i) * e;
                let src = self
                    .source_offset(block, i, j)
                    .and_then(|off| source.get(off..off + e));
                match src {
                    Some(px) => dest[at..at + e].copy_from_slice(px),
                    None => dest[at..at + e].fill(0),
                }
            }
        }
    }

    /// Write `data` back into block `block` of `dest`. Positions past the edge
    /// are skipped.
    pub fn set_block(&self, dest: &mut [u8], block: usize, data: &[u8]) {
        let e = self.elements;
        for j in 0..self.size {
            for i in 0..self.size {
                let at = (j * self.size + i) * e;
                let Some(off) = self.source_offset(block, i, j) else {
                    continue;
                };
                if let (Some(px), Some(src)) = (dest.get_mut(off..off + e), data.get(at..at + e)) {
                    px.copy_from_slice(src);
                }
            }
        }
    }

    /// Read a block and linearize it in zigzag order. Only meaningful for
    /// single-element planes.
    pub fn get_zigzag_block(&self, source: &[u8], block: usize, order: &[usize]) -> Vec<u8> {
        let raster = self.get_block(source, block);
        order.iter().map(|&k| raster[k]).collect()
    }

    /// Inverse of [`get_zigzag_block`](Self::get_zigzag_block).
    pub fn set_zigzag_block(&self, dest: &mut [u8], block: usize, data: &[u8], order: &[usize]) {
        let mut raster = vec![0u8; self.block_len()];
        for (&k, &v) in order.iter().zip(data) {
            raster[k] = v;
        }
        self.set_block(dest, block, &raster);
    }
}

/// Diagonal (JPEG-style) traversal of a `size x size` block.
///
/// `zigzag_index(n)[k]` is the raster position visited k-th.
pub fn zigzag_index(size: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(size * size);
    if size == 0 {
        return order;
    }
    for diag in 0..(2 * size - 1) {
        let lo = diag.saturating_sub(size - 1);
        let hi = diag.min(size - 1);
        if diag % 2 == 0 {
            // up-right: row decreasing
            for row in (lo..=hi).rev() {
                order.push(row * size + (diag - row));
            }
        } else {
            for row in lo..=hi {
                order.push(row * size + (diag - row));
            }
        }
    }
    order
}
