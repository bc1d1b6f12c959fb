/// Opaque identifier for a database row, backed by a Postgres bigserial.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Id(i64);

impl Id {
    pub fn new(n: i64) -> Self {
        Id(n)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id(n)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a world version row, distinct from a raw `Id` so the
/// repositories in `dem` and `chunks` can't accidentally swap it for another
/// table's key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorldVersionId(i64);

impl WorldVersionId {
    pub fn new(n: i64) -> Self {
        WorldVersionId(n)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for WorldVersionId {
    fn from(n: i64) -> Self {
        WorldVersionId(n)
    }
}

impl std::fmt::Display for WorldVersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
