/// Maps structured tensor indices onto flat storage offsets.
pub trait TensorIndex<const N: usize, const R: usize> {
    /// Converts a valid index into a buffer offset for tensor storage.
    fn offset_from_index(index: [usize; R]) -> usize;

    /// Counts all unique indices used to store the tensor.
    fn count() -> usize;

    /// Calls a function for each unique index.
    /// Must visit indices in the same order as `Self::offset_from_index`
    /// lays them out in storage.
    fn for_each_index(f: impl FnMut([usize; R]));
}

/// General tensor implementation with no symmetries of the form Tᵢⱼₖ...
pub struct Gen;

impl<const N: usize, const R: usize> TensorIndex<N, R> for Gen {
    fn offset_from_index(index: [usize; R]) -> usize {
        let mut result = 0;
        let mut stride = 1;

        for i in (0..R).rev() {
            result += stride * index[i];
            stride *= N;
        }

        result
    }

    fn count() -> usize {
        N.pow(R as u32)
    }

    fn for_each_index(mut f: impl FnMut([usize; R])) {
        if R == 0 {
            f([0; R]);
            return;
        }

        if N == 0 {
            return;
        }

        let mut cursor = [0; R];

        f(cursor);

        'l: loop {
            for slot in (0..R).rev() {
                cursor[slot] += 1;

                if cursor[slot] < N {
                    f(cursor);
                    continue 'l;
                }

                cursor[slot] = 0;
            }

            break;
        }
    }
}

/// A tensor of the form T₍ᵢⱼ₎, stored as the lower triangle and iterated
/// row major with `col <= row`.
pub struct Sym;

impl<const N: usize> TensorIndex<N, 2> for Sym {
    fn offset_from_index([mut row, mut col]: [usize; 2]) -> usize {
        if col > row {
            std::mem::swap(&mut row, &mut col);
        }

        // Use gaussian addition to find the row offset.
        let row_offset = (row * (row + 1)) / 2;
        row_offset + col
    }

    fn count() -> usize {
        N * (N + 1) / 2
    }

    fn for_each_index(mut f: impl FnMut([usize; 2])) {
        for row in 0..N {
            for col in 0..=row {
                f([row, col]);
            }
        }
    }
}

/// A rank 3 tensor of the form T₍ᵢⱼ₎ₖ, symmetric in its leading pair.
pub struct SymVec;

impl<const N: usize> TensorIndex<N, 3> for SymVec {
    fn offset_from_index([row, col, slot]: [usize; 3]) -> usize {
        <Sym as TensorIndex<N, 2>>::offset_from_index([row, col]) * N + slot
    }

    fn count() -> usize {
        (N * (N + 1) / 2) * N
    }

    fn for_each_index(mut f: impl FnMut([usize; 3])) {
        for row in 0..N {
            for col in 0..=row {
                for slot in 0..N {
                    f([row, col, slot]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sym_iterates_lower_triangle_in_storage_order() {
        let mut visited = Vec::new();
        <Sym as TensorIndex<3, 2>>::for_each_index(|idx| visited.push(idx));

        assert_eq!(
            visited,
            vec![[0, 0], [1, 0], [1, 1], [2, 0], [2, 1], [2, 2]]
        );

        for (offset, idx) in visited.into_iter().enumerate() {
            assert_eq!(<Sym as TensorIndex<3, 2>>::offset_from_index(idx), offset);
        }
    }

    #[test]
    fn sym_folds_transposed_indices() {
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(
                    <Sym as TensorIndex<3, 2>>::offset_from_index([row, col]),
                    <Sym as TensorIndex<3, 2>>::offset_from_index([col, row]),
                );
            }
        }
    }

    #[test]
    fn sym_vec_shares_the_pair_fold() {
        for k in 0..3 {
            assert_eq!(
                <SymVec as TensorIndex<3, 3>>::offset_from_index([2, 1, k]),
                <SymVec as TensorIndex<3, 3>>::offset_from_index([1, 2, k]),
            );
        }

        assert_eq!(<SymVec as TensorIndex<3, 3>>::count(), 18);
    }

    #[test]
    fn gen_count_and_offsets_cover_the_cube() {
        assert_eq!(<Gen as TensorIndex<3, 2>>::count(), 9);

        let mut offsets = Vec::new();
        <Gen as TensorIndex<3, 2>>::for_each_index(|idx| {
            offsets.push(<Gen as TensorIndex<3, 2>>::offset_from_index(idx))
        });

        assert_eq!(offsets, (0..9).collect::<Vec<_>>());
    }
}
