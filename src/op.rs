/// The 34 CHIP 8 op codes this interpreter executes. Register indices are
/// guaranteed to be between 0x0 and 0xF, addresses are 12 bits wide
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Op {
    // 0XXX
    // 00E0 	Display 	disp_clear() 	Clears the screen.
    DispClear,
    // 00EE 	Flow 	return; 	Returns from a subroutine.
    Return,

    // 1NNN 	Flow 	goto NNN;
    Goto(u16),

    // 2NNN 	Flow 	*(0xNNN)()
    GotoSubRtn(u16),

    // 3XNN 	Cond 	if(Vx==NN)
    CondVxEq(u8, u8),

    // 4XNN 	Cond 	if(Vx!=NN)
    CondVxNe(u8, u8),

    // 5XY0 	Cond 	if(Vx==Vy)
    CondVxVyEq(u8, u8),

    // 6XNN 	Const 	Vx = NN
    ConstSetVx(u8, u8),

    // 7XNN 	Const 	Vx += NN
    ConstAddVx(u8, u8),

    // 8XXX
    AssignVyToVx(u8, u8),
    BitOpOr(u8, u8),
    BitOpAnd(u8, u8),
    BitOpXor(u8, u8),
    MathVxAddVy(u8, u8),
    MathVxMinusVy(u8, u8),
    BitOpRtShift(u8),
    MathVyMinusVx(u8, u8),
    BitOpLftShift(u8),

    // 9XY0 	Cond 	if(Vx!=Vy)
    CondVxVyNe(u8, u8),

    // ANNN 	MEM 	I = NNN
    MemSetI(u16),

    // BNNN 	Flow 	PC=V0+NNN
    GotoPlusV0(u16),

    // CXNN 	Rand 	Vx=rand()&NN
    Rand(u8, u8),

    // DXYN 	Disp 	draw(Vx,Vy,N)
    DispDraw(u8, u8, u8),

    // EXXX
    KeyOpEqVx(u8),
    KeyOpNeVx(u8),

    // FXXX
    DelayGet(u8),
    KeyOpGet(u8),
    DelaySet(u8),
    SoundSet(u8),
    MemIPlusEqVx(u8),
    MemISetSprite(u8),
    Bcd(u8),
    RegDump(u8),
    RegLoad(u8),
}

impl Op {
    /// Decode a 16-bit instruction word. Returns None if the word matches no
    /// instruction, which the Emulator reports as an illegal instruction
    pub fn decode(item: u16) -> Option<Self> {
        let mask = 0xF;

        // these are the 4 nibbles of item, where nibb_1 is the MSB and nibb_4 is the LSB
        let nibb_1 = ((item >> 12) & mask) as u8;
        let x = ((item >> 8) & mask) as u8;
        let y = ((item >> 4) & mask) as u8;
        let n = (item & mask) as u8;
        let kk = (item & 0xFF) as u8;
        let nnn = item & 0x0FFF;

        let op = match nibb_1 {
            0x0 => match kk {
                0xE0 => Op::DispClear,
                0xEE => Op::Return,
                _ => return None,
            },
            0x1 => Op::Goto(nnn),
            0x2 => Op::GotoSubRtn(nnn),
            0x3 => Op::CondVxEq(x, kk),
            0x4 => Op::CondVxNe(x, kk),
            0x5 => Op::CondVxVyEq(x, y),
            0x6 => Op::ConstSetVx(x, kk),
            0x7 => Op::ConstAddVx(x, kk),
            0x8 => match n {
                0x0 => Op::AssignVyToVx(x, y),
                0x1 => Op::BitOpOr(x, y),
                0x2 => Op::BitOpAnd(x, y),
                0x3 => Op::BitOpXor(x, y),
                0x4 => Op::MathVxAddVy(x, y),
                0x5 => Op::MathVxMinusVy(x, y),
                0x6 => Op::BitOpRtShift(x),
                0x7 => Op::MathVyMinusVx(x, y),
                0xE => Op::BitOpLftShift(x),
                _ => return None,
            },
            0x9 => Op::CondVxVyNe(x, y),
            0xA => Op::MemSetI(nnn),
            0xB => Op::GotoPlusV0(nnn),
            0xC => Op::Rand(x, kk),
            0xD => Op::DispDraw(x, y, n),
            0xE => match kk {
                0x9E => Op::KeyOpEqVx(x),
                0xA1 => Op::KeyOpNeVx(x),
                _ => return None,
            },
            0xF => match kk {
                0x07 => Op::DelayGet(x),
                0x0A => Op::KeyOpGet(x),
                0x15 => Op::DelaySet(x),
                0x18 => Op::SoundSet(x),
                0x1E => Op::MemIPlusEqVx(x),
                0x29 => Op::MemISetSprite(x),
                0x33 => Op::Bcd(x),
                0x55 => Op::RegDump(x),
                0x65 => Op::RegLoad(x),
                _ => return None,
            },
            _ => unreachable!("a nibble is at most 0xF"),
        };

        Some(op)
    }

    /// Returns true if executing this op may change the display, so callers
    /// know when to redraw
    pub fn is_display_op(&self) -> bool {
        matches!(self, Op::DispClear | Op::DispDraw(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_opcodes() {
        let mut op_num = 0x00E0;
        assert_eq!(Op::decode(op_num), Some(Op::DispClear));

        op_num = 0x00EE;
        assert_eq!(Op::decode(op_num), Some(Op::Return));

        op_num = 0x1000;
        assert_eq!(Op::decode(op_num), Some(Op::Goto(0x000)));

        op_num = 0x2AAA;
        assert_eq!(Op::decode(op_num), Some(Op::GotoSubRtn(0xAAA)));

        op_num = 0x3FAA;
        assert_eq!(Op::decode(op_num), Some(Op::CondVxEq(0xF, 0xAA)));

        op_num = 0x4FAA;
        assert_eq!(Op::decode(op_num), Some(Op::CondVxNe(0xF, 0xAA)));

        op_num = 0x5FA0;
        assert_eq!(Op::decode(op_num), Some(Op::CondVxVyEq(0xF, 0xA)));

        op_num = 0x6FAB;
        assert_eq!(Op::decode(op_num), Some(Op::ConstSetVx(0xF, 0xAB)));

        op_num = 0x7FAB;
        assert_eq!(Op::decode(op_num), Some(Op::ConstAddVx(0xF, 0xAB)));

        op_num = 0x8FA0;
        assert_eq!(Op::decode(op_num), Some(Op::AssignVyToVx(0xF, 0xA)));

        op_num = 0x8FA1;
        assert_eq!(Op::decode(op_num), Some(Op::BitOpOr(0xF, 0xA)));

        op_num = 0x8FA2;
        assert_eq!(Op::decode(op_num), Some(Op::BitOpAnd(0xF, 0xA)));

        op_num = 0x8FA3;
        assert_eq!(Op::decode(op_num), Some(Op::BitOpXor(0xF, 0xA)));

        op_num = 0x8FA4;
        assert_eq!(Op::decode(op_num), Some(Op::MathVxAddVy(0xF, 0xA)));

        op_num = 0x8FA5;
        assert_eq!(Op::decode(op_num), Some(Op::MathVxMinusVy(0xF, 0xA)));

        op_num = 0x8FA6;
        assert_eq!(Op::decode(op_num), Some(Op::BitOpRtShift(0xF)));

        op_num = 0x8FA7;
        assert_eq!(Op::decode(op_num), Some(Op::MathVyMinusVx(0xF, 0xA)));

        op_num = 0x8FAE;
        assert_eq!(Op::decode(op_num), Some(Op::BitOpLftShift(0xF)));

        op_num = 0x9FA0;
        assert_eq!(Op::decode(op_num), Some(Op::CondVxVyNe(0xF, 0xA)));

        op_num = 0xAFAB;
        assert_eq!(Op::decode(op_num), Some(Op::MemSetI(0xFAB)));

        op_num = 0xBFAB;
        assert_eq!(Op::decode(op_num), Some(Op::GotoPlusV0(0xFAB)));

        op_num = 0xCFAB;
        assert_eq!(Op::decode(op_num), Some(Op::Rand(0xF, 0xAB)));

        op_num = 0xDFAB;
        assert_eq!(Op::decode(op_num), Some(Op::DispDraw(0xF, 0xA, 0xB)));

        op_num = 0xEF9E;
        assert_eq!(Op::decode(op_num), Some(Op::KeyOpEqVx(0xF)));

        op_num = 0xEFA1;
        assert_eq!(Op::decode(op_num), Some(Op::KeyOpNeVx(0xF)));

        op_num = 0xF907;
        assert_eq!(Op::decode(op_num), Some(Op::DelayGet(0x9)));

        op_num = 0xF90A;
        assert_eq!(Op::decode(op_num), Some(Op::KeyOpGet(0x9)));

        op_num = 0xF915;
        assert_eq!(Op::decode(op_num), Some(Op::DelaySet(0x9)));

        op_num = 0xF918;
        assert_eq!(Op::decode(op_num), Some(Op::SoundSet(0x9)));

        op_num = 0xF91E;
        assert_eq!(Op::decode(op_num), Some(Op::MemIPlusEqVx(0x9)));

        op_num = 0xF929;
        assert_eq!(Op::decode(op_num), Some(Op::MemISetSprite(0x9)));

        op_num = 0xF933;
        assert_eq!(Op::decode(op_num), Some(Op::Bcd(0x9)));

        op_num = 0xF955;
        assert_eq!(Op::decode(op_num), Some(Op::RegDump(0x9)));

        op_num = 0xF965;
        assert_eq!(Op::decode(op_num), Some(Op::RegLoad(0x9)));
    }

    #[test]
    fn zero_page_matches_on_low_byte_only() {
        // the second nibble is not part of the match for 00E0/00EE
        assert_eq!(Op::decode(0x0AE0), Some(Op::DispClear));
        assert_eq!(Op::decode(0x0FEE), Some(Op::Return));

        // machine code routines (0NNN) are not supported
        assert_eq!(Op::decode(0x0FFF), None);
        assert_eq!(Op::decode(0x0000), None);
        assert_eq!(Op::decode(0x00E1), None);
    }

    #[test]
    fn skip_register_ops_ignore_low_nibble() {
        assert_eq!(Op::decode(0x5AB7), Some(Op::CondVxVyEq(0xA, 0xB)));
        assert_eq!(Op::decode(0x9AB7), Some(Op::CondVxVyNe(0xA, 0xB)));
    }

    #[test]
    fn unknown_opcodes_8() {
        assert_eq!(Op::decode(0x8DEF), None);
        assert_eq!(Op::decode(0x8DE8), None);
    }

    #[test]
    fn unknown_opcodes_e() {
        assert_eq!(Op::decode(0xED9F), None);
    }

    #[test]
    fn unknown_opcodes_f() {
        assert_eq!(Op::decode(0xFDEF), None);
        assert_eq!(Op::decode(0xF000), None);
    }

    #[test]
    fn display_ops() {
        assert!(Op::DispClear.is_display_op());
        assert!(Op::DispDraw(0, 1, 5).is_display_op());
        assert!(!Op::Return.is_display_op());
        assert!(!Op::ConstSetVx(0, 1).is_display_op());
    }
}
