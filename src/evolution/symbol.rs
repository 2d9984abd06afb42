use strum_macros::{EnumIter, FromRepr, IntoStaticStr};

/// Grammar tokens. Non-terminals carry negative codes, terminals positive ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(i16)]
pub enum Symbol {
    // Non-terminals
    Expression = -1,
    SetExpression = -2,
    UnaryOperation = -3,
    BinaryOperation = -4,
    AggregateOperation = -5,
    SetOperation = -6,
    NodeScalarProperty = -8,
    NodeSetProperty = -9,
    Constant = -10,
    SamplePopulation = -11,

    AggregationScopeMarker = 1,

    Add = 2,
    Subtract = 3,
    Multiply = 4,
    Divide = 5,
    Pow = 6,
    Minimum = 7,
    Maximum = 8,

    Negate = 9,
    Exp = 10,
    SquareRoot = 11,
    Log = 12,
    Reciprocal = 13,
    Square = 14,

    Cardinality = 15,
    Union = 16,
    Intersection = 17,
    SetDifference = 18,
    SymmetricSetDifference = 19,

    SumOverInactiveNeighbors = 20,
    AverageOverInactiveNeighbors = 21,
    MaximumOverInactiveNeighbors = 22,
    MinimumOverInactiveNeighbors = 23,

    DegreeInCurrentScope = 24,
    ThresholdInCurrentScope = 25,
    ActiveNeighborsCountInCurrentScope = 26,
    DeficitInCurrentScope = 27,
    InactiveNeighborsCountInCurrentScope = 28,
    NeighborsInCurrentScope = 29,
    InactiveNeighborsInCurrentScope = 30,

    DegreeInOuterScope = 31,
    ThresholdInOuterScope = 32,
    ActiveNeighborsCountInOuterScope = 33,
    DeficitInOuterScope = 34,
    InactiveNeighborsCountInOuterScope = 35,
    NeighborsInOuterScope = 36,
    InactiveNeighborsInOuterScope = 37,

    OneSixteenth = 38,
    OneEighth = 39,
    OneQuarter = 40,
    OneHalf = 41,
    Zero = 42,
    One = 43,
    Two = 44,
    Four = 45,
    Eight = 46,
    Sixteen = 47,
}

const FIRST_TERMINAL_CODE: i16 = Symbol::AggregationScopeMarker as i16;

impl Symbol {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::from_repr(code)
    }

    pub fn is_terminal(self) -> bool {
        self.code() >= FIRST_TERMINAL_CODE
    }

    pub fn is_non_terminal(self) -> bool {
        !self.is_terminal()
    }

    pub fn is_aggregate_operation(self) -> bool {
        matches!(
            self,
            Symbol::SumOverInactiveNeighbors
                | Symbol::AverageOverInactiveNeighbors
                | Symbol::MaximumOverInactiveNeighbors
                | Symbol::MinimumOverInactiveNeighbors
        )
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_codes_round_trip() {
        for symbol in Symbol::iter() {
            assert_eq!(Symbol::from_code(symbol.code()), Some(symbol));
            assert_eq!(symbol.is_terminal(), symbol.code() > 0);
        }
        assert_eq!(Symbol::from_code(-7), None);
        assert_eq!(Symbol::from_code(48), None);
    }
}
