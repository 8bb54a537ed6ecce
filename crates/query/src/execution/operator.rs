//! Iterator-style operator protocol: `open`/`next`/`close`, with the tuple
//! produced by the last successful `next()` available via `output()`.

use storage::{BufferPoolManager, PageId};

use crate::QueryError;
use crate::execution::slotted_page::{self, MAX_SLOTS};
use crate::execution::tuple::{Field, Tuple};

pub trait PhysicalOperator {
    fn open(&mut self) -> Result<(), QueryError>;
    fn next(&mut self) -> Result<bool, QueryError>;
    fn close(&mut self) -> Result<(), QueryError>;
    fn output(&self) -> Option<&Tuple>;
}

/// Scans every live tuple across all pages, in page order then slot order.
pub struct ScanOperator<'a> {
    buffer_pool: &'a mut BufferPoolManager,
    current_page_id: PageId,
    current_slot: usize,
    current_tuple: Option<Tuple>,
}

impl<'a> ScanOperator<'a> {
    pub fn new(buffer_pool: &'a mut BufferPoolManager) -> Self {
        Self {
            buffer_pool,
            current_page_id: 0,
            current_slot: 0,
            current_tuple: None,
        }
    }

    fn load_next_tuple(&mut self) -> Result<(), QueryError> {
        let num_pages = self.buffer_pool.num_pages();
        while self.current_page_id < num_pages {
            let page_id = self.current_page_id;
            let start_slot = self.current_slot;
            let found = self.buffer_pool.with_page(page_id, |page| {
                let mut slot = start_slot;
                while slot < MAX_SLOTS {
                    if let Some(tuple) = slotted_page::read_tuple(page, slot)? {
                        return Ok::<_, QueryError>(Some((slot, tuple)));
                    }
                    slot += 1;
                }
                Ok(None)
            })??;

            match found {
                Some((slot, tuple)) => {
                    self.current_slot = slot + 1;
                    self.current_tuple = Some(tuple);
                    return Ok(());
                }
                None => {
                    self.current_page_id += 1;
                    self.current_slot = 0;
                }
            }
        }
        self.current_tuple = None;
        Ok(())
    }
}

impl PhysicalOperator for ScanOperator<'_> {
    fn open(&mut self) -> Result<(), QueryError> {
        self.current_page_id = 0;
        self.current_slot = 0;
        self.load_next_tuple()
    }

    fn next(&mut self) -> Result<bool, QueryError> {
        if self.current_tuple.is_none() {
            return Ok(false);
        }
        self.load_next_tuple()?;
        Ok(self.current_tuple.is_some())
    }

    fn close(&mut self) -> Result<(), QueryError> {
        self.current_tuple = None;
        Ok(())
    }

    fn output(&self) -> Option<&Tuple> {
        self.current_tuple.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateType {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// An operand is either a literal field (`Direct`) or an index into the
/// tuple being evaluated (`Indirect`).
#[derive(Debug, Clone)]
pub enum Operand {
    Direct(Field),
    Indirect(usize),
}

#[derive(Debug, Clone)]
pub struct Predicate {
    pub left: Operand,
    pub right: Operand,
    pub predicate_type: PredicateType,
}

impl Predicate {
    pub fn new(left: Operand, right: Operand, predicate_type: PredicateType) -> Self {
        Self {
            left,
            right,
            predicate_type,
        }
    }

    /// Resolves both operands against `fields`, then compares them. Returns
    /// `Ok(false)` (with a logged diagnostic) on a type mismatch, matching
    /// the source's non-fatal "invalid field reference" behavior.
    pub fn check(&self, fields: &[Field]) -> Result<bool, QueryError> {
        let left = resolve(&self.left, fields)?;
        let right = resolve(&self.right, fields)?;

        let result = match (left, right) {
            (Field::Int32(l), Field::Int32(r)) => Some(compare(l, r, self.predicate_type)),
            (Field::Float32(l), Field::Float32(r)) => Some(compare(l, r, self.predicate_type)),
            (Field::String(l), Field::String(r)) => Some(compare(l, r, self.predicate_type)),
            _ => None,
        };

        match result {
            Some(value) => Ok(value),
            None => {
                log::warn!("predicate compared fields of different types");
                Ok(false)
            }
        }
    }
}

fn resolve<'a>(operand: &'a Operand, fields: &'a [Field]) -> Result<&'a Field, QueryError> {
    match operand {
        Operand::Direct(field) => Ok(field),
        Operand::Indirect(index) => fields.get(*index).ok_or_else(|| {
            QueryError::Decode(format!("predicate operand index {index} out of range"))
        }),
    }
}

fn compare<T: PartialOrd>(left: T, right: T, predicate_type: PredicateType) -> bool {
    match predicate_type {
        PredicateType::Eq => left == right,
        PredicateType::Ne => left != right,
        PredicateType::Gt => left > right,
        PredicateType::Ge => left >= right,
        PredicateType::Lt => left < right,
        PredicateType::Le => left <= right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_indirect_gt_false_le_true() {
        let fields = [Field::int(10), Field::int(20)];
        let gt = Predicate::new(Operand::Indirect(0), Operand::Indirect(1), PredicateType::Gt);
        assert_eq!(gt.check(&fields).unwrap(), false);

        let le = Predicate::new(Operand::Indirect(0), Operand::Indirect(1), PredicateType::Le);
        assert_eq!(le.check(&fields).unwrap(), true);
    }

    #[test]
    fn test_predicate_direct_operand() {
        let fields = [Field::int(5)];
        let predicate = Predicate::new(
            Operand::Indirect(0),
            Operand::Direct(Field::int(5)),
            PredicateType::Eq,
        );
        assert!(predicate.check(&fields).unwrap());
    }

    #[test]
    fn test_predicate_type_mismatch_returns_false() {
        let fields = [Field::int(5), Field::string("five")];
        let predicate = Predicate::new(Operand::Indirect(0), Operand::Indirect(1), PredicateType::Eq);
        assert_eq!(predicate.check(&fields).unwrap(), false);
    }

    #[test]
    fn test_predicate_out_of_range_index_errors() {
        let fields = [Field::int(5)];
        let predicate = Predicate::new(Operand::Indirect(3), Operand::Direct(Field::int(5)), PredicateType::Eq);
        assert!(predicate.check(&fields).is_err());
    }
}
