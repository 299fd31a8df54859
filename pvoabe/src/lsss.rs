//! Linear secret sharing over a monotone span program.
//!
//! A secret is split into one share per matrix row; any set of rows spanning
//! the target vector `(1, 0, ..., 0)` recovers it, either as a scalar
//! or "in the exponent" of group-encoded shares.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "default-rng")]
use rand_core::OsRng;

use rand_core::{CryptoRng, RngCore};

use crate::curve::{CurveScalar, GroupElement, ScalarError};
use crate::policy::AccessMatrix;
use crate::secret_box::SecretBox;

/// Errors of the secret sharing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LsssError {
    /// The access structure is malformed (no rows, no columns, ragged rows, missing labels).
    InvalidMatrix(String),
    /// The selected rows do not span the target vector.
    PolicyNotSatisfied,
    /// A row index outside of the matrix was given.
    InvalidRow(usize),
    /// A coefficient refers to a row for which no element was supplied.
    MissingRow(usize),
    /// The encoded shares are not the image of any single sharing vector.
    InconsistentShares,
    /// Scalar arithmetic or randomness failure.
    Scalar(ScalarError),
}

impl fmt::Display for LsssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMatrix(message) => write!(f, "Invalid access matrix: {}", message),
            Self::PolicyNotSatisfied => write!(f, "The selected rows do not satisfy the policy"),
            Self::InvalidRow(row) => write!(f, "Row {} is not in the access matrix", row),
            Self::MissingRow(row) => write!(f, "No element supplied for row {}", row),
            Self::InconsistentShares => write!(f, "The shares do not come from one sharing"),
            Self::Scalar(err) => write!(f, "{}", err),
        }
    }
}

impl From<ScalarError> for LsssError {
    fn from(err: ScalarError) -> Self {
        Self::Scalar(err)
    }
}

/// Shares of one secret, one per row of the access matrix.
///
/// The shares are wiped from memory on drop.
#[derive(Clone, Debug)]
pub struct ShareSet(SecretBox<Vec<CurveScalar>>);

impl ShareSet {
    /// The share of row `row`.
    pub fn get(&self, row: usize) -> Option<&CurveScalar> {
        self.0.as_secret().get(row)
    }

    /// The number of shares (equal to the number of matrix rows).
    pub fn len(&self) -> usize {
        self.0.as_secret().len()
    }

    /// Always `false` for shares produced by [`share_with_rng`].
    pub fn is_empty(&self) -> bool {
        self.0.as_secret().is_empty()
    }

    /// Iterates over `(row, share)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CurveScalar)> {
        self.0.as_secret().iter().enumerate()
    }

    /// Encodes every share in the exponent of `base`, so that the scalars are not exposed.
    pub fn encode<G: GroupElement>(&self, base: &G) -> GroupEncodedShares<G> {
        self.iter()
            .map(|(row, share)| (row, base.pow(share)))
            .collect()
    }
}

/// Group-encoded shares keyed by row; the iteration order is the row order.
pub type GroupEncodedShares<G> = BTreeMap<usize, G>;

/// Splits `secret` into one share per row of `matrix`.
///
/// A fresh random vector `v` with `v[0] = secret` is drawn on every call,
/// and the share of row `i` is `M_i · v`.
pub fn share_with_rng(
    rng: &mut (impl CryptoRng + RngCore),
    matrix: &AccessMatrix,
    secret: &CurveScalar,
) -> Result<ShareSet, LsssError> {
    if matrix.num_rows() == 0 || matrix.num_cols() == 0 {
        return Err(LsssError::InvalidMatrix("empty matrix".into()));
    }

    let mut vector = SecretBox::new(Vec::with_capacity(matrix.num_cols()));
    vector.as_mut_secret().push(*secret);
    for _ in 1..matrix.num_cols() {
        vector.as_mut_secret().push(CurveScalar::try_random(rng)?);
    }

    let mut shares = SecretBox::new(Vec::with_capacity(matrix.num_rows()));
    for i in 0..matrix.num_rows() {
        let row = matrix.row(i).ok_or(LsssError::InvalidRow(i))?;
        let share = row
            .iter()
            .zip(vector.as_secret().iter())
            .fold(CurveScalar::zero(), |acc, (m, v)| &acc + &(m * v));
        shares.as_mut_secret().push(share);
    }

    Ok(ShareSet(shares))
}

/// Splits `secret` into one share per row of `matrix` using the default RNG.
#[cfg(feature = "default-rng")]
pub fn share(matrix: &AccessMatrix, secret: &CurveScalar) -> Result<ShareSet, LsssError> {
    share_with_rng(&mut OsRng, matrix, secret)
}

/// Coefficients `w_i` such that `Σ w_i · M_i = (1, 0, ..., 0)` over one subset of rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconstructionCoefficients(BTreeMap<usize, CurveScalar>);

impl ReconstructionCoefficients {
    /// The coefficient of row `row`.
    pub fn get(&self, row: usize) -> Option<&CurveScalar> {
        self.0.get(&row)
    }

    /// Iterates over `(row, coefficient)` pairs in ascending row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CurveScalar)> {
        self.0.iter().map(|(row, w)| (*row, w))
    }

    /// The rows the coefficients were computed for, in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for coefficients of a satisfying subset.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies the coefficients to scalar shares, recovering the secret.
    pub fn combine_shares(&self, shares: &ShareSet) -> Result<CurveScalar, LsssError> {
        self.iter().try_fold(CurveScalar::zero(), |acc, (row, w)| {
            let share = shares.get(row).ok_or(LsssError::MissingRow(row))?;
            Ok(&acc + &(w * share))
        })
    }
}

/// The system `M_I^T · w = e1` for a subset `I` of the rows, in row echelon form.
///
/// The pivot of every column is the first unprocessed equation (from the top)
/// with a nonzero entry in it. Unknowns without a pivot are free.
struct EchelonSystem {
    /// One equation per column of `M`, with the right-hand side as the last entry.
    equations: Vec<Vec<CurveScalar>>,
    /// `pivots[k]` is the unknown eliminated by equation `k`, in increasing order.
    pivots: Vec<usize>,
    num_unknowns: usize,
}

impl EchelonSystem {
    fn new(matrix: &AccessMatrix, rows: &[usize]) -> Result<Self, LsssError> {
        let selected = rows
            .iter()
            .map(|&i| matrix.row(i).ok_or(LsssError::InvalidRow(i)))
            .collect::<Result<Vec<_>, _>>()?;

        let num_unknowns = rows.len();
        let num_equations = matrix.num_cols();

        let mut equations: Vec<Vec<CurveScalar>> = (0..num_equations)
            .map(|j| {
                let mut equation: Vec<CurveScalar> = selected.iter().map(|row| row[j]).collect();
                equation.push(if j == 0 {
                    CurveScalar::one()
                } else {
                    CurveScalar::zero()
                });
                equation
            })
            .collect();

        let mut pivots = Vec::<usize>::new();
        for unknown in 0..num_unknowns {
            let next = pivots.len();
            let candidate = (next..num_equations).find(|&k| !equations[k][unknown].is_zero());
            let pivot_equation = match candidate {
                Some(k) => k,
                None => continue,
            };
            equations.swap(next, pivot_equation);

            let inverse = equations[next][unknown].invert()?;
            for entry in equations[next].iter_mut() {
                *entry = &*entry * &inverse;
            }

            for k in (next + 1)..num_equations {
                let factor = equations[k][unknown];
                if factor.is_zero() {
                    continue;
                }
                for col in unknown..=num_unknowns {
                    let reduced = &equations[k][col] - &(&factor * &equations[next][col]);
                    equations[k][col] = reduced;
                }
            }

            pivots.push(unknown);
        }

        Ok(Self {
            equations,
            pivots,
            num_unknowns,
        })
    }

    /// Every equation left without a pivot reads `0 = rhs`.
    fn is_consistent(&self) -> bool {
        self.equations[self.pivots.len()..]
            .iter()
            .all(|equation| equation[self.num_unknowns].is_zero())
    }

    fn free_unknowns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_unknowns).filter(move |unknown| !self.pivots.contains(unknown))
    }

    /// Fills in the pivot unknowns of `solution`, whose free unknowns are already set.
    /// With `homogeneous`, the right-hand side is taken as zero.
    fn back_substitute(&self, solution: &mut [CurveScalar], homogeneous: bool) {
        let n = self.num_unknowns;
        for (k, &unknown) in self.pivots.iter().enumerate().rev() {
            let equation = &self.equations[k];
            let rhs = if homogeneous {
                CurveScalar::zero()
            } else {
                equation[n]
            };
            let value = ((unknown + 1)..n).fold(rhs, |acc, col| {
                &acc - &(&equation[col] * &solution[col])
            });
            solution[unknown] = value;
        }
    }

    /// One exact solution with every free unknown set to zero.
    fn solve(&self, rows: &[usize]) -> Result<ReconstructionCoefficients, LsssError> {
        if !self.is_consistent() {
            tracing::debug!(
                rows = rows.len(),
                "selected rows do not span the target vector"
            );
            return Err(LsssError::PolicyNotSatisfied);
        }

        let mut solution = vec![CurveScalar::zero(); self.num_unknowns];
        self.back_substitute(&mut solution, false);
        Ok(ReconstructionCoefficients(
            rows.iter().copied().zip(solution).collect(),
        ))
    }

    /// A vector `u` with `Σ u_i·M_i = 0`, with `u[free] = 1` and the other free unknowns zero.
    fn dependency(&self, free: usize) -> Vec<CurveScalar> {
        let mut dependency = vec![CurveScalar::zero(); self.num_unknowns];
        dependency[free] = CurveScalar::one();
        self.back_substitute(&mut dependency, true);
        dependency
    }
}

/// Solves `w · M_I = e1` for the rows `I`, by Gaussian elimination
/// on the transposed submatrix against `e1`.
///
/// Free unknowns are set to zero, so the result is one fixed solution for identical inputs.
fn solve_coefficients(
    matrix: &AccessMatrix,
    rows: &[usize],
) -> Result<ReconstructionCoefficients, LsssError> {
    if rows.is_empty() {
        return Err(LsssError::PolicyNotSatisfied);
    }
    EchelonSystem::new(matrix, rows)?.solve(rows)
}

/// Finds coefficients reconstructing the secret from the rows labelled with `attributes`.
///
/// Fails with [`LsssError::PolicyNotSatisfied`] if those rows do not span the target vector.
pub fn reconstruct_coefficients<'a>(
    matrix: &AccessMatrix,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<ReconstructionCoefficients, LsssError> {
    let rows = matrix.rows_for(attributes);
    solve_coefficients(matrix, &rows)
}

/// Finds coefficients reconstructing the secret from an explicit set of rows.
pub fn reconstruct_coefficients_for_rows(
    matrix: &AccessMatrix,
    rows: impl IntoIterator<Item = usize>,
) -> Result<ReconstructionCoefficients, LsssError> {
    let mut rows: Vec<usize> = rows.into_iter().collect();
    rows.sort_unstable();
    rows.dedup();
    solve_coefficients(matrix, &rows)
}

/// Applies reconstruction coefficients in the exponent:
/// returns `Π elements[i]^{w_i}` over the rows of `coefficients`.
pub fn combine_in_exponent<G: GroupElement>(
    coefficients: &ReconstructionCoefficients,
    elements: &BTreeMap<usize, G>,
) -> Result<G, LsssError> {
    coefficients
        .iter()
        .try_fold(G::identity(), |acc, (row, w)| {
            let element = elements.get(&row).ok_or(LsssError::MissingRow(row))?;
            Ok(acc.combine(&element.pow(w)))
        })
}

/// Recovers `base^s` from a subset of group-encoded shares `base^{λ_i}`.
///
/// The coefficients are computed for exactly the rows present in `shares`.
pub fn reconstruct<G: GroupElement>(
    matrix: &AccessMatrix,
    shares: &GroupEncodedShares<G>,
) -> Result<G, LsssError> {
    let rows: Vec<usize> = shares.keys().copied().collect();
    let coefficients = solve_coefficients(matrix, &rows)?;
    combine_in_exponent(&coefficients, shares)
}

/// Checks that a complete set of group-encoded shares `base^{λ_i}` comes from one sharing,
/// that is `λ = M·v` for some vector `v`, and returns the encoded secret `base^{v[0]}`.
///
/// Every linear dependency `Σ u_i·M_i = 0` between the rows of `matrix`
/// must also hold in the exponent, `Π shares[i]^{u_i} = 1`.
pub fn verify_encoded_shares<G: GroupElement>(
    matrix: &AccessMatrix,
    shares: &GroupEncodedShares<G>,
) -> Result<G, LsssError> {
    if let Some(row) = shares.keys().find(|row| **row >= matrix.num_rows()) {
        return Err(LsssError::InvalidRow(*row));
    }
    let rows: Vec<usize> = (0..matrix.num_rows()).collect();
    if let Some(row) = rows.iter().find(|row| !shares.contains_key(*row)) {
        return Err(LsssError::MissingRow(*row));
    }

    let system = EchelonSystem::new(matrix, &rows)?;
    for free in system.free_unknowns() {
        let product = rows
            .iter()
            .zip(system.dependency(free).iter())
            .filter(|(_, u)| !u.is_zero())
            .fold(G::identity(), |acc, (row, u)| acc.combine(&shares[row].pow(u)));
        if !product.canonical_eq(&G::identity()) {
            tracing::debug!(row = free, "encoded shares break a row dependency");
            return Err(LsssError::InconsistentShares);
        }
    }

    let coefficients = system.solve(&rows)?;
    combine_in_exponent(&coefficients, shares)
}

#[cfg(test)]
mod tests {

    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use rand_core::OsRng;

    use super::{
        combine_in_exponent, reconstruct, reconstruct_coefficients,
        reconstruct_coefficients_for_rows, share, share_with_rng, verify_encoded_shares,
        GroupEncodedShares, LsssError,
    };
    use crate::curve::tests::FailingRng;
    use crate::curve::{
        pairing, CurveScalar, G1Point, G2Point, GroupElement, GtElement, ScalarError,
    };
    use crate::policy::AccessMatrix;
    use crate::traits::SerializableToArray;

    fn s(x: u64) -> CurveScalar {
        CurveScalar::from(x)
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| String::from(*name)).collect()
    }

    fn concrete_matrix() -> AccessMatrix {
        AccessMatrix::new(
            vec![vec![s(1), s(1)], vec![s(0), s(1)], vec![s(1), s(0)]],
            labels(&["A", "B", "C"]),
        )
        .unwrap()
    }

    fn subset<G: Clone>(shares: &GroupEncodedShares<G>, rows: &[usize]) -> GroupEncodedShares<G> {
        rows.iter()
            .map(|row| (*row, shares[row].clone()))
            .collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let matrix = concrete_matrix();
        let secret = s(7);
        let base = G1Point::generator();

        let shares = share(&matrix, &secret).unwrap();
        assert_eq!(shares.len(), 3);
        let encoded = shares.encode(&base);

        let recovered = reconstruct(&matrix, &subset(&encoded, &[1, 2])).unwrap();
        assert_eq!(recovered, base.pow(&s(7)));

        assert_eq!(
            reconstruct(&matrix, &subset(&encoded, &[0])),
            Err(LsssError::PolicyNotSatisfied)
        );
    }

    #[test]
    fn test_redundant_rows() {
        // All three rows together are linearly dependent but still span e1.
        let matrix = concrete_matrix();
        let secret = CurveScalar::try_random(&mut OsRng).unwrap();
        let shares = share(&matrix, &secret).unwrap();

        let coefficients = reconstruct_coefficients(&matrix, ["A", "B", "C"]).unwrap();
        assert_eq!(coefficients.len(), 3);
        assert_eq!(coefficients.combine_shares(&shares).unwrap(), secret);

        let base = GtElement::generator();
        let recovered = reconstruct(&matrix, &shares.encode(&base)).unwrap();
        assert_eq!(recovered, base.pow(&secret));
    }

    #[test]
    fn test_round_trip_over_policies() {
        let cases: &[(&str, &[&[&str]])] = &[
            ("A", &[&["A"]]),
            ("A AND B AND C", &[&["A", "B", "C"]]),
            ("A OR B OR C", &[&["A"], &["B"], &["C"], &["A", "C"]]),
            (
                "(A AND B) OR (C AND D)",
                &[&["A", "B"], &["C", "D"], &["A", "B", "C"], &["A", "B", "C", "D"]],
            ),
            (
                "A AND (B OR (C AND D)) AND E",
                &[&["A", "B", "E"], &["A", "C", "D", "E"], &["A", "B", "C", "D", "E"]],
            ),
            ("(A AND B) OR (A AND C)", &[&["A", "B"], &["A", "C"]]),
        ];

        for (policy, satisfying) in cases.iter() {
            let matrix = AccessMatrix::from_policy(policy).unwrap();
            for attributes in satisfying.iter() {
                for _ in 0..3 {
                    let secret = CurveScalar::try_random(&mut OsRng).unwrap();
                    let exponent = CurveScalar::try_random(&mut OsRng).unwrap();
                    let base = G2Point::generator().pow(&exponent);
                    let encoded = share(&matrix, &secret).unwrap().encode(&base);

                    let rows = matrix.rows_for(attributes.iter().copied());
                    let recovered = reconstruct(&matrix, &subset(&encoded, &rows)).unwrap();
                    assert_eq!(recovered, base.pow(&secret), "policy {}", policy);
                }
            }
        }
    }

    #[test]
    fn test_rejection_of_unsatisfying_sets() {
        let cases: &[(&str, &[&[&str]])] = &[
            ("A AND B", &[&["A"], &["B"], &[]]),
            ("(A AND B) OR (C AND D)", &[&["A", "C"], &["B", "D"], &["A", "D"]]),
            ("A AND (B OR C)", &[&["B", "C"], &["A"]]),
        ];

        for (policy, unsatisfying) in cases.iter() {
            let matrix = AccessMatrix::from_policy(policy).unwrap();
            let encoded = share(&matrix, &s(42))
                .unwrap()
                .encode(&G1Point::generator());
            for attributes in unsatisfying.iter() {
                assert_eq!(
                    reconstruct_coefficients(&matrix, attributes.iter().copied()),
                    Err(LsssError::PolicyNotSatisfied),
                    "policy {}",
                    policy
                );
                let rows = matrix.rows_for(attributes.iter().copied());
                assert_eq!(
                    reconstruct(&matrix, &subset(&encoded, &rows)),
                    Err(LsssError::PolicyNotSatisfied)
                );
            }
        }
    }

    #[test]
    fn test_invalid_and_missing_rows() {
        let matrix = concrete_matrix();
        let mut shares = BTreeMap::new();
        shares.insert(1, G1Point::generator());
        shares.insert(5, G1Point::generator());
        assert_eq!(reconstruct(&matrix, &shares), Err(LsssError::InvalidRow(5)));

        let coefficients = reconstruct_coefficients_for_rows(&matrix, [2, 1]).unwrap();
        let mut elements = BTreeMap::new();
        elements.insert(1, G1Point::generator());
        assert_eq!(
            combine_in_exponent(&coefficients, &elements),
            Err(LsssError::MissingRow(2))
        );
    }

    #[test]
    fn test_coefficients_are_deterministic() {
        let matrix = AccessMatrix::from_policy("(A AND B) OR (B AND C) OR (A AND C)").unwrap();
        let attributes = ["A", "B", "C"];

        let first = reconstruct_coefficients(&matrix, attributes).unwrap();
        let second = reconstruct_coefficients(&matrix, attributes).unwrap();
        assert_eq!(first, second);

        let encode = |coefficients: &super::ReconstructionCoefficients| {
            coefficients
                .iter()
                .flat_map(|(row, w)| {
                    let mut bytes = (row as u32).to_be_bytes().to_vec();
                    bytes.extend_from_slice(&w.to_array());
                    bytes
                })
                .collect::<Vec<u8>>()
        };
        assert_eq!(encode(&first), encode(&second));
    }

    #[test]
    fn test_shares_are_fresh() {
        let matrix = AccessMatrix::from_policy("A AND B").unwrap();
        let first = share(&matrix, &s(7)).unwrap();
        let second = share(&matrix, &s(7)).unwrap();
        assert_ne!(first.get(0), second.get(0));
    }

    #[test]
    fn test_verify_encoded_shares() {
        // Rows for B and C are equal, so their shares must be too.
        let matrix = AccessMatrix::from_policy("A AND (B OR C) AND (D OR E)").unwrap();
        let secret = CurveScalar::try_random(&mut OsRng).unwrap();
        let base = G1Point::generator().pow(&CurveScalar::try_random(&mut OsRng).unwrap());
        let encoded = share(&matrix, &secret).unwrap().encode(&base);

        assert_eq!(
            verify_encoded_shares(&matrix, &encoded),
            Ok(base.pow(&secret))
        );

        // Row 0 takes part in no dependency; the others do.
        for row in 1..matrix.num_rows() {
            let mut tampered = encoded.clone();
            let shifted = tampered[&row].combine(&base);
            tampered.insert(row, shifted);
            assert_eq!(
                verify_encoded_shares(&matrix, &tampered),
                Err(LsssError::InconsistentShares),
                "row {}",
                row
            );
        }

        // Shares of two different sharings do not mix either.
        let other = share(&matrix, &secret).unwrap().encode(&base);
        let mut mixed = encoded.clone();
        mixed.insert(2, other[&2]);
        assert_eq!(
            verify_encoded_shares(&matrix, &mixed),
            Err(LsssError::InconsistentShares)
        );
    }

    #[test]
    fn test_verify_encoded_shares_without_dependencies() {
        // A full-rank matrix admits any share vector; only the encoded secret changes.
        let matrix = AccessMatrix::from_policy("A AND B").unwrap();
        let base = G1Point::generator();
        let mut encoded = share(&matrix, &s(7)).unwrap().encode(&base);
        assert_eq!(verify_encoded_shares(&matrix, &encoded), Ok(base.pow(&s(7))));

        let shifted = encoded[&0].combine(&base);
        encoded.insert(0, shifted);
        assert_eq!(verify_encoded_shares(&matrix, &encoded), Ok(base.pow(&s(8))));
    }

    #[test]
    fn test_verify_encoded_shares_rows() {
        let matrix = concrete_matrix();
        let encoded = share(&matrix, &s(7)).unwrap().encode(&G1Point::generator());

        let mut missing = encoded.clone();
        missing.remove(&1);
        assert_eq!(
            verify_encoded_shares(&matrix, &missing),
            Err(LsssError::MissingRow(1))
        );

        let mut extra = encoded;
        extra.insert(3, G1Point::generator());
        assert_eq!(
            verify_encoded_shares(&matrix, &extra),
            Err(LsssError::InvalidRow(3))
        );
    }

    #[test]
    fn test_randomness_failure() {
        let matrix = AccessMatrix::from_policy("A AND B").unwrap();
        assert_eq!(
            share_with_rng(&mut FailingRng, &matrix, &s(7)).map(|shares| shares.len()),
            Err(LsssError::Scalar(ScalarError::RandomnessSourceFailure))
        );
    }

    #[test]
    fn test_coefficients_on_pairing_outputs() {
        // The coefficients can also be applied to values derived from the shares,
        // here `e(g1^{λ_i}, h)`.
        let matrix = AccessMatrix::from_policy("A AND (B OR C)").unwrap();
        let secret = CurveScalar::try_random(&mut OsRng).unwrap();
        let h = G2Point::generator().pow(&CurveScalar::try_random(&mut OsRng).unwrap());
        let encoded = share(&matrix, &secret)
            .unwrap()
            .encode(&G1Point::generator());

        let coefficients = reconstruct_coefficients(&matrix, ["A", "C"]).unwrap();
        let paired: BTreeMap<usize, GtElement> = coefficients
            .rows()
            .map(|row| (row, pairing(&encoded[&row], &h)))
            .collect();

        let recovered = combine_in_exponent(&coefficients, &paired).unwrap();
        assert_eq!(recovered, pairing(&G1Point::generator(), &h).pow(&secret));
    }
}
