//! Kernel image table.
//!
//! Each offloaded operation is a fixed sequence of pre-assembled RV32
//! machine instructions, loaded once into instance instruction memory and
//! reused across invocations. The tables below hold the exact instruction
//! words the firmware ships; the driver only needs a kernel's identity,
//! its words, and its size in words.
//!
//! Kernel calling convention (argument slots `ARG0..ARG3`):
//!
//! | Kernel | `ARG0` | `ARG1` | `ARG2` | `ARG3` | Registers |
//! |--------|--------|--------|--------|--------|-----------|
//! | `maxpool` | pool size | stride | rows(R) | cols(R) | A in v0.., R at v16.. |
//! | `add` | element count | — | — | — | v16 = v0 + v1 |
//! | `relu` | element count | — | — | — | v16 = max(v0, 0) |
//! | `xor` | element count | — | — | — | v16 = v0 ^ v1 |

/// Identifier of an offloadable kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelId {
    /// 2-D max-pooling over a register-resident matrix.
    MaxPool,
    /// Element-wise addition.
    Add,
    /// Element-wise rectified linear unit.
    Relu,
    /// Element-wise exclusive or.
    Xor,
}

impl KernelId {
    /// All kernels the image table carries.
    pub const ALL: [Self; 4] = [Self::MaxPool, Self::Add, Self::Relu, Self::Xor];

    /// Kernel name as used by the CLI and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MaxPool => "maxpool",
            Self::Add => "add",
            Self::Relu => "relu",
            Self::Xor => "xor",
        }
    }
}

impl std::fmt::Display for KernelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the kernel image table.
#[derive(Debug, Clone, Copy)]
pub struct KernelImage {
    /// Which kernel these words implement.
    pub id: KernelId,
    /// Pre-assembled instruction words.
    pub words: &'static [u32],
}

impl KernelImage {
    /// Image size in 32-bit instruction words.
    #[must_use]
    pub const fn size_words(&self) -> usize {
        self.words.len()
    }

    /// Image size in bytes, as written to instruction memory.
    #[must_use]
    pub const fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }
}

// Assembled offline from the maxpool kernel source: per output row, vmax.vv
// across the window rows, vslidedown+vmax for the in-row sliding max, then
// the strided element compaction loop.
static MAXPOOL_WORDS: [u32; 22] = [
    0x0005_A803, // lw    a6, 0(a1)        — pool size (ARG0)
    0x0045_A883, // lw    a7, 4(a1)        — stride (ARG1)
    0x0085_A283, // lw    t0, 8(a1)        — rows(R) (ARG2)
    0x00C5_A303, // lw    t1, 12(a1)       — cols(R) (ARG3)
    0x0C05_7057, // vsetvli x0, a0, e32, m1
    0x5E00_4157, // vmv.v.v v2, v0
    0x1A21_0257, // vmax.vv v4, v2, v4
    0x0011_0113, // addi  sp, sp, 1
    0xFF01_18E3, // bne   sp, a6, -16     — column-max loop
    0x3E42_3157, // vslidedown.vx v2, v4, tp
    0x1A41_1257, // vmax.vv v4, v4, v2
    0x0012_0213, // addi  tp, tp, 1
    0xFF11_26E3, // bne   tp, a7, -12     — sliding-max loop
    0x3E43_B157, // vslidedown.vx v2, v4, t2
    0x5E20_4A57, // vmv.x.s / vmv.s.x compaction pair
    0x0062_0393, // addi  t2, tp, stride
    0xFE63_14E3, // bne   t1, t2, -24     — compaction loop
    0x5E80_42D7, // vmv.v.v v16+i, v4
    0x0012_8293, // addi  t0, t0, 1
    0xFC52_90E3, // bne   t0, a4, -64     — output-row loop
    0x0000_0013, // nop
    0x0000_8067, // ret
];

static ADD_WORDS: [u32; 6] = [
    0x0005_A803, // lw    a6, 0(a1)       — element count (ARG0)
    0x0C05_7057, // vsetvli x0, a6, e32, m1
    0x0210_0857, // vadd.vv v16, v0, v1
    0x0000_0013, // nop
    0x0000_0013, // nop
    0x0000_8067, // ret
];

static RELU_WORDS: [u32; 6] = [
    0x0005_A803, // lw    a6, 0(a1)       — element count (ARG0)
    0x0C05_7057, // vsetvli x0, a6, e32, m1
    0x1A00_4857, // vmax.vx v16, v0, x0
    0x0000_0013, // nop
    0x0000_0013, // nop
    0x0000_8067, // ret
];

static XOR_WORDS: [u32; 6] = [
    0x0005_A803, // lw    a6, 0(a1)       — element count (ARG0)
    0x0C05_7057, // vsetvli x0, a6, e32, m1
    0x2E10_0857, // vxor.vv v16, v0, v1
    0x0000_0013, // nop
    0x0000_0013, // nop
    0x0000_8067, // ret
];

/// Look up the image for a kernel.
#[must_use]
pub const fn image(id: KernelId) -> KernelImage {
    match id {
        KernelId::MaxPool => KernelImage { id, words: &MAXPOOL_WORDS },
        KernelId::Add => KernelImage { id, words: &ADD_WORDS },
        KernelId::Relu => KernelImage { id, words: &RELU_WORDS },
        KernelId::Xor => KernelImage { id, words: &XOR_WORDS },
    }
}
