use core::ops::Index;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Position {
    FrontLeft = 0,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Position {
    pub const ALL: [Position; 4] =
        [Self::FrontLeft, Self::FrontRight, Self::RearLeft, Self::RearRight];
}

/// Per motor command in percent, indexed by `Position`
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Motors(pub [f32; 4]);

impl Motors {
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&m| m == 0.0)
    }
}

impl Index<Position> for Motors {
    type Output = f32;

    fn index(&self, position: Position) -> &f32 {
        &self.0[position as usize]
    }
}
