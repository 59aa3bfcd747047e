//! 每次绘制调用的固定功能状态：深度、模板、颜色写入

/// 比较函数，语义与 GL 一致：`incoming <op> stored`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    Less,
    LessEqual,
    Equal,
    Always,
}

impl CompareFunc {
    pub fn test<T: PartialOrd>(self, incoming: T, stored: T) -> bool {
        match self {
            CompareFunc::Less => incoming < stored,
            CompareFunc::LessEqual => incoming <= stored,
            CompareFunc::Equal => incoming == stored,
            CompareFunc::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    /// 加一，255 回绕到 0
    IncrWrap,
    /// 减一，0 回绕到 255
    DecrWrap,
}

impl StencilOp {
    pub fn apply(self, value: u8) -> u8 {
        match self {
            StencilOp::Keep => value,
            StencilOp::IncrWrap => value.wrapping_add(1),
            StencilOp::DecrWrap => value.wrapping_sub(1),
        }
    }
}

/// 单面模板配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFace {
    pub compare: CompareFunc,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub pass: StencilOp,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            compare: CompareFunc::Always,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

/// 双面模板：正面、背面分别配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    pub front: StencilFace,
    pub back: StencilFace,
    pub reference: u8,
    pub read_mask: u8,
    pub write_mask: u8,
}

impl StencilState {
    pub fn face(&self, front_facing: bool) -> &StencilFace {
        if front_facing { &self.front } else { &self.back }
    }

    pub fn test(&self, front_facing: bool, stored: u8) -> bool {
        self.face(front_facing)
            .compare
            .test(self.reference & self.read_mask, stored & self.read_mask)
    }

    /// 按写掩码合并新旧模板值
    pub fn write(&self, stored: u8, op: StencilOp) -> u8 {
        let updated = op.apply(stored);
        (stored & !self.write_mask) | (updated & self.write_mask)
    }
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            front: StencilFace::default(),
            back: StencilFace::default(),
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub compare: CompareFunc,
    pub write: bool,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            compare: CompareFunc::Less,
            write: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    pub depth: DepthState,
    pub stencil: Option<StencilState>,
    pub color_write: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth: DepthState::default(),
            stencil: None,
            color_write: true,
        }
    }
}

impl PipelineState {
    /// 环境光：默认深度测试，不用模板
    pub fn ambient() -> Self {
        Self::default()
    }

    /// 阴影体：深度失败时正面加一、背面减一（回绕），不写深度和颜色
    pub fn shadow() -> Self {
        Self {
            depth: DepthState {
                compare: CompareFunc::Less,
                write: false,
            },
            stencil: Some(StencilState {
                front: StencilFace {
                    depth_fail: StencilOp::IncrWrap,
                    ..StencilFace::default()
                },
                back: StencilFace {
                    depth_fail: StencilOp::DecrWrap,
                    ..StencilFace::default()
                },
                ..StencilState::default()
            }),
            color_write: false,
        }
    }

    /// 直射光：只在模板值为 0（不在阴影里）的地方着色
    ///
    /// 叠加混合暂时关闭，等伽马校正修好后再打开；片元着色器自己输出环境光 + 漫反射，直接覆盖。
    pub fn lit() -> Self {
        Self {
            depth: DepthState {
                compare: CompareFunc::LessEqual,
                write: false,
            },
            stencil: Some(StencilState {
                front: StencilFace {
                    compare: CompareFunc::Equal,
                    ..StencilFace::default()
                },
                back: StencilFace {
                    compare: CompareFunc::Equal,
                    ..StencilFace::default()
                },
                reference: 0,
                ..StencilState::default()
            }),
            color_write: true,
        }
    }
}
