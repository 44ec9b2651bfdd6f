#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Offset(pub i32, pub i32);

/// Cardinal steps in the order every grid walk uses: E, W, S, N.
pub const CARDINAL: [Offset; 4] = [Offset(1, 0), Offset(-1, 0), Offset(0, 1), Offset(0, -1)];

impl Offset {
    pub fn apply(self, i: i32, j: i32) -> (i32, i32) {
        (i + self.0, j + self.1)
    }
}

/// True when two cells touch, including diagonally. Border runs break where
/// this fails.
pub fn touches(a: (i32, i32), b: (i32, i32)) -> bool {
    (a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1
}
