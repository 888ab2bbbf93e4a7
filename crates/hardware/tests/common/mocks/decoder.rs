use mockall::mock;
use rvsim_state::isa::{InstructionDecoder, ProgramStatement};

mock! {
    pub Decoder {}
    impl InstructionDecoder for Decoder {
        fn decode(&self, binary: u32, address: u32) -> ProgramStatement;
    }
}
