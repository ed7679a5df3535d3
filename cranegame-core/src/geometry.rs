use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32, // draw ordering only
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn vec2(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    pub fn set_vec2(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }
}

/// Anchor vocabulary shared by anchors and edges. The numeric codes are the
/// ones accepted by `Edge::try_from(u8)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Top = 0,
    Center = 1,
    Bottom = 2,
    Left = 3,
    Right = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    InvalidEdge(u8),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidEdge(code) => write!(f, "invalid edge (code {code})"),
        }
    }
}

impl Error for GeometryError {}

impl Edge {
    pub fn normal(self) -> [f32; 2] {
        match self {
            Edge::Left => [-1.0, 0.0],
            Edge::Top => [0.0, -1.0],
            Edge::Right => [1.0, 0.0],
            Edge::Bottom => [0.0, 1.0],
        }
    }
}

impl TryFrom<Keyword> for Edge {
    type Error = GeometryError;

    fn try_from(keyword: Keyword) -> Result<Self, Self::Error> {
        match keyword {
            Keyword::Left => Ok(Edge::Left),
            Keyword::Right => Ok(Edge::Right),
            Keyword::Top => Ok(Edge::Top),
            Keyword::Bottom => Ok(Edge::Bottom),
            Keyword::Center => Err(GeometryError::InvalidEdge(Keyword::Center as u8)),
        }
    }
}

impl TryFrom<u8> for Edge {
    type Error = GeometryError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Edge::Top),
            2 => Ok(Edge::Bottom),
            3 => Ok(Edge::Left),
            4 => Ok(Edge::Right),
            other => Err(GeometryError::InvalidEdge(other)),
        }
    }
}

/// Axis-aligned box positioned through an anchor point. The stored position is
/// the anchor, `raw_pos` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    width: f32,
    height: f32,
    horizontal: Horizontal,
    vertical: Vertical,
    offset_x: f32,
    offset_y: f32,
    position: Vector3,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            horizontal: Horizontal::Left,
            vertical: Vertical::Top,
            offset_x: 0.0,
            offset_y: 0.0,
            position: Vector3::default(),
        }
    }

    pub fn with_anchor(mut self, horizontal: Horizontal, vertical: Vertical) -> Self {
        self.set_anchor(horizontal, vertical);
        self
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width, self.height]
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.set_anchor(self.horizontal, self.vertical);
    }

    pub fn anchor(&self) -> (Horizontal, Vertical) {
        (self.horizontal, self.vertical)
    }

    pub fn offset(&self) -> [f32; 2] {
        [self.offset_x, self.offset_y]
    }

    pub fn position(&self) -> &Vector3 {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut Vector3 {
        &mut self.position
    }

    pub fn raw_pos(&self) -> [f32; 2] {
        [
            self.position.x - self.offset_x,
            self.position.y - self.offset_y,
        ]
    }

    pub fn set_anchor(&mut self, horizontal: Horizontal, vertical: Vertical) {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self.offset_x = match horizontal {
            Horizontal::Left => 0.0,
            Horizontal::Center => self.width / 2.0,
            Horizontal::Right => self.width,
        };
        self.offset_y = match vertical {
            Vertical::Top => 0.0,
            Vertical::Center => self.height / 2.0,
            Vertical::Bottom => self.height,
        };
    }

    /// Pixel coordinate of any named anchor point on the box, independent of
    /// the anchor currently in use.
    pub fn vec_of(&self, horizontal: Horizontal, vertical: Vertical) -> [f32; 2] {
        let [left, top] = self.raw_pos();
        let x = match horizontal {
            Horizontal::Left => left,
            Horizontal::Center => left + self.width / 2.0,
            Horizontal::Right => left + self.width,
        };
        let y = match vertical {
            Vertical::Top => top,
            Vertical::Center => top + self.height / 2.0,
            Vertical::Bottom => top + self.height,
        };
        [x, y]
    }

    pub fn normal_vector_of(&self, side: Keyword) -> Result<[f32; 2], GeometryError> {
        Ok(Edge::try_from(side)?.normal())
    }

    pub fn is_within(&self, x: f32, y: f32) -> bool {
        let [x1, y1] = self.raw_pos();
        // A 1x1 box behaves as a point.
        if self.width == 1.0 && self.height == 1.0 {
            return x == x1 && y == y1;
        }
        let x2 = x1 + self.width;
        let y2 = y1 + self.height;
        x > x1 && x < x2 && y > y1 && y < y2
    }

    pub fn does_collide(&self, other: &Bounds) -> bool {
        let [w1, h1] = self.size();
        let [x1, y1] = self.raw_pos();
        let [w2, h2] = other.size();
        let [x2, y2] = other.raw_pos();
        !(x2 + w2 < x1 || x2 > x1 + w1 || y2 + h2 < y1 || y2 > y1 + h1)
    }

    /// Returns (edge of self, touching edge of other) for the first overlap found,
    /// checked in the order left, right, top, bottom.
    pub fn collision_edges(&self, other: &Bounds) -> Option<(Edge, Edge)> {
        let [w1, h1] = self.size();
        let [x1, y1] = self.raw_pos();
        let [w2, h2] = other.size();
        let [x2, y2] = other.raw_pos();

        if x1 + w1 >= x2 && x1 < x2 {
            return Some((Edge::Left, Edge::Right));
        }
        if x1 <= x2 + w2 && x1 + w1 > x2 + w2 {
            return Some((Edge::Right, Edge::Left));
        }
        if y1 + h1 >= y2 && y1 < y2 {
            return Some((Edge::Top, Edge::Bottom));
        }
        if y1 <= y2 + h2 && y1 + h1 > y2 + h2 {
            return Some((Edge::Bottom, Edge::Top));
        }
        None
    }
}
