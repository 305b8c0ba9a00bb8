use crate::consts::BYTES_PER_LENGTH_OFFSET;

/// Size hint of an SSZ type: the exact length for fixed-size types or a lower bound otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Size {
    Fixed { size: usize },
    Variable { minimum_size: usize },
}

impl Size {
    /// Number of bytes a value of this size occupies in the fixed part of an enclosing container.
    #[must_use]
    pub const fn fixed_part(self) -> usize {
        match self {
            Self::Fixed { size } => size,
            Self::Variable { .. } => BYTES_PER_LENGTH_OFFSET,
        }
    }

    #[must_use]
    pub const fn minimum_size(self) -> usize {
        match self {
            Self::Fixed { size } => size,
            Self::Variable { minimum_size } => minimum_size,
        }
    }

    /// Length of the fixed region of a container with fields of the given sizes.
    #[must_use]
    pub const fn fixed_region(fields: &[Self]) -> usize {
        let mut total = 0;
        let mut index = 0;

        while index < fields.len() {
            total += fields[index].fixed_part();
            index += 1;
        }

        total
    }

    #[must_use]
    pub const fn for_container(fields: &[Self]) -> Self {
        let mut minimum_size = 0;
        let mut fixed = true;
        let mut index = 0;

        while index < fields.len() {
            let field = fields[index];
            minimum_size += field.fixed_part();

            if let Self::Variable {
                minimum_size: field_minimum,
            } = field
            {
                minimum_size += field_minimum;
                fixed = false;
            }

            index += 1;
        }

        if fixed {
            Self::Fixed { size: minimum_size }
        } else {
            Self::Variable { minimum_size }
        }
    }

    #[must_use]
    pub const fn for_vector(element: Self, length: usize) -> Self {
        match element {
            Self::Fixed { size } => Self::Fixed {
                size: size * length,
            },
            Self::Variable { minimum_size } => Self::Variable {
                minimum_size: (BYTES_PER_LENGTH_OFFSET + minimum_size) * length,
            },
        }
    }
}
