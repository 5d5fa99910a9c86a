//! Shelf bin packing for atlas pages
//!
//! A page is divided into horizontal shelves. Insertion walks the shelves
//! top to bottom and takes the first one the rectangle fits on; otherwise a
//! new shelf of exactly the rectangle's height opens below the existing
//! ones. Fragmentation is accepted in exchange for O(shelves) insertion and
//! zero bookkeeping; glyph boxes at a fixed resolution cluster into few
//! heights, so shelves stay full enough in practice.

#[derive(Debug, Clone, Copy)]
struct Shelf {
    y: u32,
    height: u32,
    cursor_x: u32,
}

/// First-fit shelf packer over a fixed `width` x `height` page
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    shelves: Vec<Shelf>,
    used_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            shelves: Vec::new(),
            used_height: 0,
        }
    }

    /// Place a `w` x `h` rectangle and return its top-left corner, or `None`
    /// when neither an existing shelf nor the remaining vertical space can
    /// hold it.
    pub fn insert(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 || w > self.width {
            return None;
        }

        for shelf in &mut self.shelves {
            if h <= shelf.height && w <= self.width - shelf.cursor_x {
                let position = (shelf.cursor_x, shelf.y);
                shelf.cursor_x += w;
                return Some(position);
            }
        }

        if self.used_height + h > self.height {
            return None;
        }

        let shelf = Shelf {
            y: self.used_height,
            height: h,
            cursor_x: w,
        };
        self.used_height += h;
        self.shelves.push(shelf);
        Some((0, shelf.y))
    }
}
