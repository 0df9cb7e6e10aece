use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.w == 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Large enough to contain anything a window can show; used as "no clip".
    pub const UNBOUNDED: Rect = Rect {
        x: -10000.0,
        y: -10000.0,
        w: 20000.0,
        h: 20000.0,
    };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// Overlap of two rects. Disjoint rects collapse to a zero-sized rect at the
    /// nearest corner rather than going negative.
    pub fn intersect(&self, o: &Rect) -> Rect {
        let x1 = self.x.max(o.x);
        let y1 = self.y.max(o.y);
        let x2 = self.right().min(o.right()).max(x1);
        let y2 = self.bottom().min(o.bottom()).max(y1);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn union(&self, o: &Rect) -> Rect {
        let x1 = self.x.min(o.x);
        let y1 = self.y.min(o.y);
        let x2 = self.right().max(o.right());
        let y2 = self.bottom().max(o.bottom());
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Shrinks by `t` on every edge, clamping the size at zero.
    pub fn inset(&self, t: f32) -> Rect {
        if t <= 0.0 {
            return *self;
        }
        Rect::new(
            self.x + t,
            self.y + t,
            (self.w - t * 2.0).max(0.0),
            (self.h - t * 2.0).max(0.0),
        )
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

/// Column-major 4x4 matrix (`m[col][row]`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(t: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[3][0] = t.x;
        out.m[3][1] = t.y;
        out.m[3][2] = t.z;
        out
    }

    pub fn scale(s: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][1] = s.y;
        out.m[2][2] = s.z;
        out
    }

    /// Euler rotation in radians, applied X then Y then Z (`Rz * Ry * Rx`).
    pub fn rotation_euler(r: Vec3) -> Self {
        let (sx, cx) = r.x.sin_cos();
        let (sy, cy) = r.y.sin_cos();
        let (sz, cz) = r.z.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0] = [cy * cz, cy * sz, -sy, 0.0];
        out.m[1] = [sx * sy * cz - cx * sz, sx * sy * sz + cx * cz, sx * cy, 0.0];
        out.m[2] = [cx * sy * cz + sx * sz, cx * sy * sz - sx * cz, cx * cy, 0.0];
        out
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3 {
            x: m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
            y: m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
            z: m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
        }
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, b: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[k][r] * b.m[c][k]).sum();
            }
        }
        Mat4 { m: out }
    }
}

/// Local placement of a node on top of its layout position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3, // radians
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// `T(origin + position) * R(rotation) * S(scale)`. A zero scale component
    /// is read as 1 so unset specs never collapse a node.
    pub fn to_matrix(&self, origin: Vec2) -> Mat4 {
        let fix = |v: f32| if v == 0.0 { 1.0 } else { v };
        let s = Vec3::new(fix(self.scale.x), fix(self.scale.y), fix(self.scale.z));
        let t = Vec3::new(
            origin.x + self.position.x,
            origin.y + self.position.y,
            self.position.z,
        );
        Mat4::translation(t) * (Mat4::rotation_euler(self.rotation) * Mat4::scale(s))
    }
}
