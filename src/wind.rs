use rand::Rng;

/// Wind speed band. The discriminant doubles as the speed bound `wsd` used to
/// sample particle speeds in `[-wsd, wsd)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindClass {
    Calm = 4,
    Light = 5,
    Moderate = 6,
    Strong = 7,
}

impl WindClass {
    pub fn from_speed(speed: f64) -> Self {
        if speed < 4.0 {
            WindClass::Calm
        } else if speed < 9.0 {
            WindClass::Light
        } else if speed < 14.0 {
            WindClass::Moderate
        } else {
            WindClass::Strong
        }
    }

    pub fn speed_bound(self) -> f32 {
        self as u32 as f32
    }

    pub fn sample_speed<R: Rng + ?Sized>(self, rng: &mut R) -> f32 {
        let bound = self.speed_bound();
        rng.gen_range(-bound..bound)
    }
}

/// One of eight 45 degree compass sectors, starting at north.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionBucket {
    NorthNorthEast,
    NorthEastEast,
    EastSouthEast,
    SouthEastSouth,
    SouthSouthWest,
    SouthWestWest,
    WestNorthWest,
    NorthWestNorth,
}

const BUCKETS: [DirectionBucket; 8] = [
    DirectionBucket::NorthNorthEast,
    DirectionBucket::NorthEastEast,
    DirectionBucket::EastSouthEast,
    DirectionBucket::SouthEastSouth,
    DirectionBucket::SouthSouthWest,
    DirectionBucket::SouthWestWest,
    DirectionBucket::WestNorthWest,
    DirectionBucket::NorthWestNorth,
];

impl DirectionBucket {
    /// Sector index in `0..8` for any finite angle in degrees, negative
    /// angles included.
    pub fn index_of(degrees: f64) -> usize {
        let normalized = ((degrees % 360.0) + 360.0) % 360.0;
        (normalized / 45.0).floor() as usize
    }

    pub fn from_degrees(degrees: f64) -> Self {
        BUCKETS[Self::index_of(degrees)]
    }

    pub fn label(self) -> &'static str {
        match self {
            DirectionBucket::NorthNorthEast => "N-NE",
            DirectionBucket::NorthEastEast => "NE-E",
            DirectionBucket::EastSouthEast => "E-SE",
            DirectionBucket::SouthEastSouth => "SE-S",
            DirectionBucket::SouthSouthWest => "S-SW",
            DirectionBucket::SouthWestWest => "SW-W",
            DirectionBucket::WestNorthWest => "W-NW",
            DirectionBucket::NorthWestNorth => "NW-N",
        }
    }

    /// Velocity for a sampled signed speed. W-NW shares SW-W's
    /// pattern and NW-N only drifts upward.
    pub fn velocity(self, speed: f32, scalar: f32) -> Velocity {
        let s = speed;
        let (vx, vy, vz) = match self {
            DirectionBucket::NorthNorthEast => (0.0, s, s),
            DirectionBucket::NorthEastEast => (s, 0.0, s),
            DirectionBucket::EastSouthEast => (s, -s, 0.0),
            DirectionBucket::SouthEastSouth => (0.0, -s, -s),
            DirectionBucket::SouthSouthWest => (-s, 0.0, -s),
            DirectionBucket::SouthWestWest => (-s, s, 0.0),
            DirectionBucket::WestNorthWest => (-s, s, 0.0),
            DirectionBucket::NorthWestNorth => (0.0, s, 0.0),
        };
        Velocity {
            vx,
            vy,
            vz,
            scalar,
        }
    }
}

impl std::fmt::Display for DirectionBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// This should match the velocity layout in the particle compute shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub scalar: f32,
}
