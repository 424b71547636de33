#[cfg(test)]
mod tests {
    use crate::virtual_machine::isa::{
        Access, Instruction, MAX_PARAMS, OPCODE_CELL_MODULUS, OPCODE_MODULUS, OpcodeCell,
    };
    use crate::virtual_machine::operand::ParamMode;
    use num_bigint::BigInt;

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    const EXPECTED_ISA_HASH: u64 = 16575775792156553905;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    macro_rules! hash_isa {
        (
            $( $(#[$doc:meta])* $name:ident = $opcode:expr, $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ], $category:ident ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, &[crate::virtual_machine::isa::Instruction::$name as u8]);
                h = fnv1a64(h, $mnemonic.as_bytes());
                $( h = fnv1a64(h, stringify!($kind).as_bytes()); )*
                h = fnv1a64(h, stringify!($category).as_bytes());
            )*
            h
        }};
    }

    /// Folds in the opcode cell layout and each instruction's opcode, arity and access kinds.
    fn hash_decode_contract(mut h: u64) -> u64 {
        h = fnv1a64(h, &OPCODE_MODULUS.to_le_bytes());
        h = fnv1a64(h, &OPCODE_CELL_MODULUS.to_le_bytes());
        h = fnv1a64(h, &(MAX_PARAMS as u64).to_le_bytes());
        for instr in Instruction::ALL {
            h = fnv1a64(h, &[instr.opcode(), instr.arity() as u8, instr.width() as u8]);
            for access in instr.params() {
                h = fnv1a64(h, match access {
                    Access::Read => b"R",
                    Access::Write => b"W",
                });
            }
        }
        h
    }

    fn current_isa_hash() -> u64 {
        hash_decode_contract(crate::for_each_instruction!(hash_isa))
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH={}", current_isa_hash());
    }

    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }

    #[test]
    fn every_opcode_decodes_under_any_high_digits() {
        let prefixes = [
            BigInt::ZERO,
            BigInt::from(OPCODE_CELL_MODULUS),
            BigInt::from(10u8).pow(40),
        ];
        for instr in Instruction::ALL {
            for prefix in &prefixes {
                let cell = OpcodeCell::decode(&(prefix + instr.opcode()), 0).unwrap();
                assert_eq!(cell.instruction, *instr);
                assert!(cell.modes().iter().all(|m| *m == ParamMode::Position));
                assert_eq!(cell.modes().len(), instr.arity());
            }
        }
    }
}
