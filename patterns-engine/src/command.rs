use patterns_core::geometry::Point2;
use patterns_core::shape::SerializedShape;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::host::DiagramHost;
use crate::scene::ShapeHandle;

const DEFAULT_MAX_ENTRIES: usize = 100;

/// 可撤销的编辑操作。
pub trait Command: Send {
    fn name(&self) -> &'static str;

    fn execute(&mut self, host: &mut dyn DiagramHost) -> Result<(), EngineError>;

    fn rollback(&mut self, host: &mut dyn DiagramHost) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Unexecuted,
    Executed,
    RolledBack,
}

/// 把已清理、已换标识并已定位的模式形状插入图表。
#[derive(Debug)]
pub struct MaterializePatternCommand {
    shapes: Vec<SerializedShape>,
    central_point: Option<Point2>,
    drop_point: Point2,
    created: Vec<ShapeHandle>,
    state: CommandState,
}

impl MaterializePatternCommand {
    pub fn new(shapes: Vec<SerializedShape>, central_point: Option<Point2>, drop_point: Point2) -> Self {
        Self {
            shapes,
            central_point,
            drop_point,
            created: Vec::new(),
            state: CommandState::Unexecuted,
        }
    }

    #[inline]
    pub fn state(&self) -> CommandState {
        self.state
    }

    #[inline]
    pub fn created(&self) -> &[ShapeHandle] {
        &self.created
    }

    #[inline]
    pub fn shapes(&self) -> &[SerializedShape] {
        &self.shapes
    }

    #[inline]
    pub fn drop_point(&self) -> Point2 {
        self.drop_point
    }

    #[inline]
    pub fn central_point(&self) -> Option<Point2> {
        self.central_point
    }
}

impl Command for MaterializePatternCommand {
    fn name(&self) -> &'static str {
        "materialize_pattern"
    }

    fn execute(&mut self, host: &mut dyn DiagramHost) -> Result<(), EngineError> {
        if self.state != CommandState::Unexecuted {
            return Err(EngineError::AlreadyExecuted(self.name()));
        }
        self.created = host.add_shape_objects(&self.shapes)?;
        host.layout(&self.created);
        host.set_selection(self.created.clone());
        host.update_canvas();
        host.update_selection();
        self.state = CommandState::Executed;
        debug!(
            created = self.created.len(),
            x = self.drop_point.x(),
            y = self.drop_point.y(),
            "模式已插入图表"
        );
        Ok(())
    }

    /// 删除 `execute` 创建的所有形状。未执行或已回滚时不做任何事。
    ///
    /// 已不在图表中的形状视为已回滚。其他删除失败记录警告后继续处理其余形状，
    /// 最后返回只含这些失败句柄的 [`EngineError::RollbackIncomplete`]。
    fn rollback(&mut self, host: &mut dyn DiagramHost) -> Result<(), EngineError> {
        if self.state != CommandState::Executed {
            return Ok(());
        }
        let remaining: Vec<ShapeHandle> = host
            .selection()
            .into_iter()
            .filter(|handle| !self.created.contains(handle))
            .collect();
        host.set_selection(remaining);

        let mut failed = Vec::new();
        for handle in self.created.drain(..) {
            match host.delete_shape(handle) {
                Ok(()) => {}
                Err(EngineError::ShapeNotFound(_)) => {
                    debug!(handle = handle.get(), "形状已不在图表中，跳过");
                }
                Err(err) => {
                    warn!(handle = handle.get(), error = %err, "回滚时删除形状失败");
                    failed.push(handle.get());
                }
            }
        }
        host.update_canvas();
        self.state = CommandState::RolledBack;

        if failed.is_empty() {
            Ok(())
        } else {
            Err(EngineError::RollbackIncomplete { failed })
        }
    }
}

/// 已执行命令批次的撤销栈。
pub struct CommandHistory {
    done: Vec<Vec<Box<dyn Command>>>,
    max_entries: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            done: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// 依次执行整批命令。任一命令失败时回滚已执行的部分，批次不入栈。
    pub fn execute_commands(
        &mut self,
        mut commands: Vec<Box<dyn Command>>,
        host: &mut dyn DiagramHost,
    ) -> Result<(), EngineError> {
        for index in 0..commands.len() {
            if let Err(err) = commands[index].execute(host) {
                warn!(command = commands[index].name(), error = %err, "命令执行失败，回滚当前批次");
                for executed in commands[..index].iter_mut().rev() {
                    if let Err(rollback_err) = executed.rollback(host) {
                        warn!(command = executed.name(), error = %rollback_err, "批次回滚不完整");
                    }
                }
                return Err(err);
            }
        }
        if !commands.is_empty() {
            self.done.push(commands);
            while self.done.len() > self.max_entries {
                self.done.remove(0);
            }
        }
        Ok(())
    }

    /// 逆序回滚最近一批命令。所有命令都会尝试回滚，返回第一个错误。
    pub fn undo(&mut self, host: &mut dyn DiagramHost) -> Result<(), EngineError> {
        let mut batch = self.done.pop().ok_or(EngineError::NothingToUndo)?;
        let mut first_error = None;
        for command in batch.iter_mut().rev() {
            if let Err(err) = command.rollback(host) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.done.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    pub fn clear(&mut self) {
        self.done.clear();
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}
