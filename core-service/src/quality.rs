//! # Audio Quality Scales
//!
//! Every backend declares one closed, ordered set of quality levels. Levels
//! are ordered by *declaration position*, not by any value they might carry,
//! and levels of two different scales are never comparable: asking whether a
//! Tidal level is below a Deezer level is a contract violation reported as
//! [`ServiceError::QualityScaleMismatch`], never a silent `false`.
//!
//! For that reason [`QualityLevel`] deliberately has no `PartialOrd`; use
//! [`QualityLevel::try_cmp`] or the `lt`/`le`/`gt`/`ge` helpers.
//!
//! ## Declaring a scale
//!
//! ```
//! use core_service::quality_scale;
//! use core_service::quality::{Quality, QualityLevel};
//!
//! quality_scale! {
//!     /// Streaming tiers, lowest first.
//!     pub enum TestQuality { Low, Medium, High }
//! }
//!
//! let low: QualityLevel = TestQuality::Low.into();
//! let high: QualityLevel = TestQuality::High.into();
//! assert!(low.lt(&high).unwrap());
//! assert_eq!(TestQuality::scale().highest(), Some(high));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use crate::error::{Result, ServiceError};

/// The fixed level table of one backend.
///
/// Identity is the address of the `static` holding the table, so two scales
/// with identical names and levels are still distinct scales.
#[derive(Debug)]
pub struct QualityScale {
    name: &'static str,
    levels: &'static [&'static str],
}

impl QualityScale {
    pub const fn new(name: &'static str, levels: &'static [&'static str]) -> Self {
        Self { name, levels }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is(&self, other: &QualityScale) -> bool {
        ptr::eq(self, other)
    }

    pub fn level(&'static self, index: usize) -> Option<QualityLevel> {
        (index < self.levels.len()).then_some(QualityLevel { scale: self, index })
    }

    /// Look a level up by name, ignoring ASCII case.
    pub fn level_named(&'static self, name: &str) -> Option<QualityLevel> {
        self.levels
            .iter()
            .position(|level| level.eq_ignore_ascii_case(name))
            .map(|index| QualityLevel { scale: self, index })
    }

    /// Like [`level_named`](Self::level_named) but reports unknown names.
    pub fn parse(&'static self, name: &str) -> Result<QualityLevel> {
        self.level_named(name)
            .ok_or_else(|| ServiceError::UnknownQualityLevel {
                scale: self.name,
                name: name.to_string(),
            })
    }

    pub fn lowest(&'static self) -> Option<QualityLevel> {
        self.level(0)
    }

    pub fn highest(&'static self) -> Option<QualityLevel> {
        self.levels.len().checked_sub(1).and_then(|i| self.level(i))
    }

    /// Levels in ascending order.
    pub fn levels(&'static self) -> impl Iterator<Item = QualityLevel> {
        (0..self.levels.len()).map(move |index| QualityLevel { scale: self, index })
    }

    /// Fail with [`ServiceError::QualityScaleMismatch`] unless `level` is ours.
    pub fn check(&self, level: &QualityLevel) -> Result<()> {
        if level.scale.is(self) {
            Ok(())
        } else {
            Err(ServiceError::QualityScaleMismatch {
                expected: self.name,
                found: level.scale.name,
            })
        }
    }
}

/// One member of a [`QualityScale`].
#[derive(Clone, Copy)]
pub struct QualityLevel {
    scale: &'static QualityScale,
    index: usize,
}

impl QualityLevel {
    /// `index` must be a position within `scale`.
    pub(crate) const fn from_declared(scale: &'static QualityScale, index: usize) -> Self {
        Self { scale, index }
    }

    pub fn name(&self) -> &'static str {
        self.scale.levels[self.index]
    }

    pub fn scale(&self) -> &'static QualityScale {
        self.scale
    }

    /// Declaration position, 0 for the lowest level.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Compare by declaration order; levels of different scales are an error.
    pub fn try_cmp(&self, other: &QualityLevel) -> Result<Ordering> {
        self.scale.check(other)?;
        Ok(self.index.cmp(&other.index))
    }

    pub fn lt(&self, other: &QualityLevel) -> Result<bool> {
        Ok(self.try_cmp(other)? == Ordering::Less)
    }

    pub fn le(&self, other: &QualityLevel) -> Result<bool> {
        Ok(self.try_cmp(other)? != Ordering::Greater)
    }

    pub fn gt(&self, other: &QualityLevel) -> Result<bool> {
        Ok(self.try_cmp(other)? == Ordering::Greater)
    }

    pub fn ge(&self, other: &QualityLevel) -> Result<bool> {
        Ok(self.try_cmp(other)? != Ordering::Less)
    }
}

impl PartialEq for QualityLevel {
    fn eq(&self, other: &Self) -> bool {
        self.scale.is(other.scale) && self.index == other.index
    }
}

impl Eq for QualityLevel {}

impl Hash for QualityLevel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.scale, state);
        self.index.hash(state);
    }
}

impl fmt::Debug for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scale.name, self.name())
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A backend's typed quality enum, generated by [`quality_scale!`](crate::quality_scale).
pub trait Quality: Copy + Into<QualityLevel> + Send + Sync + 'static {
    fn scale() -> &'static QualityScale;
}

/// Declare a backend quality enum together with its static [`QualityScale`].
///
/// Variants are listed lowest quality first.
#[macro_export]
macro_rules! quality_scale {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $level:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $level),+
        }

        impl $crate::quality::Quality for $name {
            fn scale() -> &'static $crate::quality::QualityScale {
                static SCALE: $crate::quality::QualityScale = $crate::quality::QualityScale::new(
                    stringify!($name),
                    &[$(stringify!($level)),+],
                );
                &SCALE
            }
        }

        impl ::core::convert::From<$name> for $crate::quality::QualityLevel {
            fn from(level: $name) -> Self {
                match <$name as $crate::quality::Quality>::scale().level(level as usize) {
                    ::core::option::Option::Some(level) => level,
                    ::core::option::Option::None => ::core::unreachable!(),
                }
            }
        }
    };
}

/// Floor and ceiling for one file request.
///
/// `required` is a hard lower bound. `preferred` is the level the caller would
/// like not to exceed; it is only exceeded when nothing at or below it meets
/// the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRange {
    required: QualityLevel,
    preferred: QualityLevel,
}

impl QualityRange {
    pub fn new(required: QualityLevel, preferred: QualityLevel) -> Result<Self> {
        if required.gt(&preferred)? {
            return Err(ServiceError::InvalidQualityRange {
                required,
                preferred,
            });
        }
        Ok(Self {
            required,
            preferred,
        })
    }

    /// The whole scale, lowest to highest.
    pub fn full(scale: &'static QualityScale) -> Result<Self> {
        match (scale.lowest(), scale.highest()) {
            (Some(required), Some(preferred)) => Ok(Self {
                required,
                preferred,
            }),
            _ => Err(ServiceError::EmptyQualityScale(scale.name())),
        }
    }

    pub fn required(&self) -> QualityLevel {
        self.required
    }

    pub fn preferred(&self) -> QualityLevel {
        self.preferred
    }

    pub fn scale(&self) -> &'static QualityScale {
        self.required.scale()
    }

    pub fn contains(&self, level: &QualityLevel) -> Result<bool> {
        Ok(level.ge(&self.required)? && level.le(&self.preferred)?)
    }

    /// Pick the level to request from the ones a backend offers.
    ///
    /// Returns the highest offered level within the range; failing that, the
    /// lowest offered level above `preferred`. If nothing reaches `required`
    /// the result is [`ServiceError::InsufficientAudioQuality`].
    pub fn select<I>(&self, available: I) -> Result<QualityLevel>
    where
        I: IntoIterator<Item = QualityLevel>,
    {
        let scale = self.scale();
        let mut best_in_range: Option<QualityLevel> = None;
        let mut lowest_above: Option<QualityLevel> = None;
        let mut best_available: Option<QualityLevel> = None;

        for level in available {
            scale.check(&level)?;

            if best_available.map_or(true, |best| level.index > best.index) {
                best_available = Some(level);
            }
            if level.index < self.required.index {
                continue;
            }
            if level.index <= self.preferred.index {
                if best_in_range.map_or(true, |best| level.index > best.index) {
                    best_in_range = Some(level);
                }
            } else if lowest_above.map_or(true, |low| level.index < low.index) {
                lowest_above = Some(level);
            }
        }

        best_in_range
            .or(lowest_above)
            .ok_or(ServiceError::InsufficientAudioQuality {
                required: self.required,
                best_available,
            })
    }
}
