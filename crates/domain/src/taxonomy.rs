use bitflags::bitflags;

/// Set operations shared by all taxonomy masks.
pub trait FlagAlgebra: bitflags::Flags + Copy {
    #[must_use]
    fn has_any(self, other: Self) -> bool {
        self.intersects(other)
    }

    #[must_use]
    fn has_all(self, other: Self) -> bool {
        self.contains(other)
    }

    #[must_use]
    fn unset(self, other: Self) -> Self {
        self.difference(other)
    }

    #[must_use]
    fn count(self) -> usize {
        self.iter().count()
    }
}

impl<T: bitflags::Flags + Copy> FlagAlgebra for T {}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MuscleGroups: u64 {
        const NECK = 1 << 0;
        const UPPER_TRAPEZIUS = 1 << 1;
        const MIDDLE_TRAPEZIUS = 1 << 2;
        const LOWER_TRAPEZIUS = 1 << 3;
        const RHOMBOIDS = 1 << 4;
        const LATISSIMUS_DORSI = 1 << 5;
        const TERES_MAJOR = 1 << 6;
        const INFRASPINATUS = 1 << 7;
        const SUPRASPINATUS = 1 << 8;
        const SUBSCAPULARIS = 1 << 9;
        const TERES_MINOR = 1 << 10;
        const SERRATUS_ANTERIOR = 1 << 11;
        const PECTORALIS_MAJOR = 1 << 12;
        const PECTORALIS_MINOR = 1 << 13;
        const FRONT_DELTOID = 1 << 14;
        const SIDE_DELTOID = 1 << 15;
        const REAR_DELTOID = 1 << 16;
        const BICEPS = 1 << 17;
        const BRACHIALIS = 1 << 18;
        const TRICEPS = 1 << 19;
        const WRIST_FLEXORS = 1 << 20;
        const WRIST_EXTENSORS = 1 << 21;
        const ABDOMINALS = 1 << 22;
        const OBLIQUES = 1 << 23;
        const TRANSVERSE_ABDOMINIS = 1 << 24;
        const ERECTOR_SPINAE = 1 << 25;
        const QUADRATUS_LUMBORUM = 1 << 26;
        const HIP_FLEXORS = 1 << 27;
        const GLUTE_MAXIMUS = 1 << 28;
        const GLUTE_MEDIUS = 1 << 29;
        const GLUTE_MINIMUS = 1 << 30;
        const PIRIFORMIS = 1 << 31;
        const HIP_ADDUCTORS = 1 << 32;
        const TENSOR_FASCIAE_LATAE = 1 << 33;
        const QUADRICEPS = 1 << 34;
        const HAMSTRINGS = 1 << 35;
        const GASTROCNEMIUS = 1 << 36;
        const SOLEUS = 1 << 37;
        const TIBIALIS_ANTERIOR = 1 << 38;
        const FOOT_INTRINSICS = 1 << 39;
        const PELVIC_FLOOR = 1 << 40;
        const DIAPHRAGM = 1 << 41;
        const EYES = 1 << 42;
    }
}

impl MuscleGroups {
    pub const TRAPEZIUS: Self = Self::UPPER_TRAPEZIUS
        .union(Self::MIDDLE_TRAPEZIUS)
        .union(Self::LOWER_TRAPEZIUS);
    pub const ROTATOR_CUFF: Self = Self::INFRASPINATUS
        .union(Self::SUPRASPINATUS)
        .union(Self::SUBSCAPULARIS)
        .union(Self::TERES_MINOR);
    pub const DELTOIDS: Self = Self::FRONT_DELTOID
        .union(Self::SIDE_DELTOID)
        .union(Self::REAR_DELTOID);
    pub const GLUTES: Self = Self::GLUTE_MAXIMUS
        .union(Self::GLUTE_MEDIUS)
        .union(Self::GLUTE_MINIMUS);
    pub const CALVES: Self = Self::GASTROCNEMIUS.union(Self::SOLEUS);
    pub const CORE: Self = Self::ABDOMINALS
        .union(Self::OBLIQUES)
        .union(Self::TRANSVERSE_ABDOMINIS);
}

bitflags! {
    /// The roles a muscle can play in a variation.
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MuscleRoles: u8 {
        const STRENGTH = 1 << 0;
        const STRETCH = 1 << 1;
        const STABILITY = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MovementPattern: u32 {
        const HORIZONTAL_PUSH = 1 << 0;
        const HORIZONTAL_PULL = 1 << 1;
        const VERTICAL_PUSH = 1 << 2;
        const VERTICAL_PULL = 1 << 3;
        const SQUAT = 1 << 4;
        const LUNGE = 1 << 5;
        const HIP_HINGE = 1 << 6;
        const CARRY = 1 << 7;
        const ROTATION = 1 << 8;
        const ANTI_ROTATION = 1 << 9;
        const LOCOMOTION = 1 << 10;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MuscleContractions: u8 {
        const STATIC = 1 << 0;
        const DYNAMIC = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MuscleMovement: u8 {
        const ISOMETRIC = 1 << 0;
        const ISOTONIC = 1 << 1;
        const ISOKINETIC = 1 << 2;
        const PLYOMETRIC = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Joints: u32 {
        const CERVICAL_SPINE = 1 << 0;
        const THORACIC_SPINE = 1 << 1;
        const LUMBAR_SPINE = 1 << 2;
        const SHOULDER = 1 << 3;
        const SHOULDER_BLADE = 1 << 4;
        const ELBOW = 1 << 5;
        const WRIST = 1 << 6;
        const FINGERS = 1 << 7;
        const HIP = 1 << 8;
        const KNEE = 1 << 9;
        const ANKLE = 1 << 10;
        const TOES = 1 << 11;
    }
}

bitflags! {
    /// An empty value means the variation is not tied to a sport.
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct SportsFocus: u16 {
        const SOCCER = 1 << 0;
        const TENNIS = 1 << 1;
        const BASKETBALL = 1 << 2;
        const RUNNING = 1 << 3;
        const CYCLING = 1 << 4;
        const SWIMMING = 1 << 5;
        const CLIMBING = 1 << 6;
        const GOLF = 1 << 7;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct SkillTypes: u8 {
        const VISUAL = 1 << 0;
        const CERVICAL = 1 << 1;
        const THORACIC = 1 << 2;
        const ACCESSORY = 1 << 3;
    }
}

bitflags! {
    /// Skill bits are interpreted relative to the exercise's skill type.
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Skills: u32 {
        const _ = !0;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Section: u16 {
        const WARMUP = 1 << 0;
        const FUNCTIONAL = 1 << 1;
        const ACCESSORY = 1 << 2;
        const CORE = 1 << 3;
        const COOLDOWN = 1 << 4;
        const REHAB = 1 << 5;
        const DEBUG = 1 << 6;
    }
}

impl Section {
    pub const WORKOUT: Self = Self::FUNCTIONAL.union(Self::ACCESSORY).union(Self::CORE);

    /// Matches a variation's sections against a queried section. Debug matches everything and
    /// an empty query only matches variations without a section.
    #[must_use]
    pub fn matches(self, variation_section: Section) -> bool {
        if self.has_any(Section::DEBUG) {
            true
        } else if self.is_empty() {
            variation_section.is_empty()
        } else {
            variation_section.has_any(self)
        }
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct ExerciseFocus: u16 {
        const STRENGTH = 1 << 0;
        const SPEED = 1 << 1;
        const POWER = 1 << 2;
        const ENDURANCE = 1 << 3;
        const STABILITY = 1 << 4;
        const FLEXIBILITY = 1 << 5;
        const MOBILITY = 1 << 6;
        const AGILITY = 1 << 7;
        const BALANCE = 1 << 8;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Equipment: u32 {
        const DUMBBELLS = 1 << 0;
        const BARBELL = 1 << 1;
        const KETTLEBELL = 1 << 2;
        const RESISTANCE_BAND = 1 << 3;
        const PULL_UP_BAR = 1 << 4;
        const BENCH = 1 << 5;
        const BOX = 1 << 6;
        const CABLE = 1 << 7;
        const MEDICINE_BALL = 1 << 8;
        const EXERCISE_BALL = 1 << 9;
        const FOAM_ROLLER = 1 << 10;
        const GYMNASTIC_RINGS = 1 << 11;
        const SLIDERS = 1 << 12;
        const SUSPENSION_TRAINER = 1 << 13;
        const YOGA_BLOCK = 1 << 14;
    }
}
