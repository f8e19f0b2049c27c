/// Where the cursor sits relative to a rendered, soft-wrapped text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorDelta {
    /// visual lines the rendered text occupies
    pub lines_up: usize,
    /// full lines already passed by the cursor
    pub lines_down: usize,
    /// column of the cursor inside its line
    pub cols_over: usize,
    pub width: usize,
}

impl CursorDelta {
    /// A zero `width` is treated as a single column.
    pub fn compute(target_len: usize, typed_len: usize, width: usize) -> Self {
        let width = width.max(1);
        // overtype placeholders extend the rendering past the target
        let rendered_len = target_len.max(typed_len);

        Self {
            lines_up: rendered_len.div_ceil(width),
            lines_down: typed_len / width,
            cols_over: typed_len % width,
            width,
        }
    }

    /// Rows to climb from the line just below the text to reach the cursor row.
    pub fn rows_to_cursor(&self) -> usize {
        self.lines_up.saturating_sub(self.lines_down)
    }
}
