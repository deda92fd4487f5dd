//! 共享库步态控制器
//!
//! 绑定控制器库导出的 C ABI：
//!
//! ```text
//! void     init_controller(double freq, double gains[4]);
//! void     pre_work(double imu[10], double legs[24]);
//! void     set_gait_type(int gait);
//! void     set_robot_mode(int mode);
//! void     set_robot_vel(double vel[3]);
//! JointEff *toque_calculator(double imu[10], double legs[24]);
//! Zebra    *get_zebra_joint_control(void);
//! ```
//!
//! 返回的指针指向库内静态存储，取到后立即拷贝。
//! 库内只有一个全局控制器实例，每个进程同时只应存在一个 `SharedLibraryController`。

use crate::controller::GaitController;
use crate::error::ControllerError;
use libloading::{Library, Symbol};
use quadsim_protocol::{
    ControllerCommand, ImuPacket, JointArray, LegPacket, NUM_JOINTS, StanceGains, TorqueFrame,
    VelocityCommand,
};
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[repr(C)]
struct JointEff {
    eff: [f64; NUM_JOINTS],
}

#[repr(C)]
struct JointControl {
    position: [f64; NUM_JOINTS],
    velocity: [f64; NUM_JOINTS],
    kp: [f64; NUM_JOINTS],
    kd: [f64; NUM_JOINTS],
    effort: [f64; NUM_JOINTS],
}

type InitFn = unsafe extern "C" fn(f64, *mut f64);
type PreWorkFn = unsafe extern "C" fn(*mut f64, *mut f64);
type SetCodeFn = unsafe extern "C" fn(c_int);
type SetVelFn = unsafe extern "C" fn(*mut f64);
type TorqueFn = unsafe extern "C" fn(*mut f64, *mut f64) -> *mut JointEff;
type JointControlFn = unsafe extern "C" fn() -> *mut JointControl;

/// 从共享库加载的控制器
pub struct SharedLibraryController {
    init_controller: InitFn,
    pre_work: PreWorkFn,
    set_gait_type: SetCodeFn,
    set_robot_mode: SetCodeFn,
    set_robot_vel: SetVelFn,
    toque_calculator: TorqueFn,
    get_joint_control: JointControlFn,
    initialized: bool,
    path: PathBuf,
    // 必须比上面的函数指针活得久
    _library: Library,
}

fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, ControllerError> {
    // SAFETY: 调用方保证 `T` 与导出的 C 签名一致
    unsafe {
        let sym: Symbol<T> =
            library
                .get(name.as_bytes())
                .map_err(|e| ControllerError::MissingSymbol {
                    symbol: name,
                    reason: e.to_string(),
                })?;
        Ok(*sym)
    }
}

impl SharedLibraryController {
    /// 加载共享库并解析全部符号
    ///
    /// 文件无法打开或缺少任一符号时返回错误；加载成功即全部可调用。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ControllerError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ControllerError::Load {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }

        // SAFETY: 加载会执行库的初始化代码；控制器库来自配置，视为可信输入
        let library = unsafe { Library::new(&path) }.map_err(|e| ControllerError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let controller = Self {
            init_controller: symbol(&library, "init_controller")?,
            pre_work: symbol(&library, "pre_work")?,
            set_gait_type: symbol(&library, "set_gait_type")?,
            set_robot_mode: symbol(&library, "set_robot_mode")?,
            set_robot_vel: symbol(&library, "set_robot_vel")?,
            toque_calculator: symbol(&library, "toque_calculator")?,
            get_joint_control: symbol(&library, "get_zebra_joint_control")?,
            initialized: false,
            path,
            _library: library,
        };
        info!("Loaded gait controller from {}", controller.path.display());
        Ok(controller)
    }

    /// 共享库路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_initialized(&self) -> Result<(), ControllerError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ControllerError::NotInitialized)
        }
    }
}

impl GaitController for SharedLibraryController {
    fn init(&mut self, timestep_hz: f64, gains: &StanceGains) -> Result<(), ControllerError> {
        let mut gains = gains.to_array();
        // SAFETY: `gains` 恰为控制器读取的 4 个 double
        unsafe { (self.init_controller)(timestep_hz, gains.as_mut_ptr()) };
        self.initialized = true;
        debug!(timestep_hz, "Controller initialized");
        Ok(())
    }

    fn set_mode(&mut self, code: i32) -> Result<(), ControllerError> {
        self.ensure_initialized()?;
        // SAFETY: 控制器已初始化
        unsafe { (self.set_robot_mode)(code as c_int) };
        Ok(())
    }

    fn set_gait_type(&mut self, code: i32) -> Result<(), ControllerError> {
        self.ensure_initialized()?;
        // SAFETY: 控制器已初始化
        unsafe { (self.set_gait_type)(code as c_int) };
        Ok(())
    }

    fn set_velocity_command(&mut self, command: &VelocityCommand) -> Result<(), ControllerError> {
        self.ensure_initialized()?;
        let mut velocity = command.to_array();
        // SAFETY: `velocity` 为 3 个 double
        unsafe { (self.set_robot_vel)(velocity.as_mut_ptr()) };
        Ok(())
    }

    fn pre_step(&mut self, imu: &ImuPacket, legs: &LegPacket) -> Result<(), ControllerError> {
        self.ensure_initialized()?;
        let mut imu = *imu;
        let mut legs = *legs;
        // SAFETY: 定长报文与控制器约定一致
        unsafe { (self.pre_work)(imu.as_mut_ptr(), legs.as_mut_ptr()) };
        Ok(())
    }

    fn compute(
        &mut self,
        imu: &ImuPacket,
        legs: &LegPacket,
    ) -> Result<TorqueFrame, ControllerError> {
        self.ensure_initialized()?;
        let mut imu = *imu;
        let mut legs = *legs;
        // SAFETY: 定长报文；返回值指向库内静态存储
        let eff = unsafe {
            let ptr = (self.toque_calculator)(imu.as_mut_ptr(), legs.as_mut_ptr());
            ptr.as_ref()
                .ok_or(ControllerError::NullOutput("toque_calculator"))?
                .eff
        };
        Ok(TorqueFrame {
            eff: JointArray::new(eff),
        })
    }

    fn joint_command(&mut self) -> Result<ControllerCommand, ControllerError> {
        self.ensure_initialized()?;
        // SAFETY: 返回值指向库内静态存储
        let control = unsafe {
            (self.get_joint_control)()
                .as_ref()
                .ok_or(ControllerError::NullOutput("get_zebra_joint_control"))?
        };
        Ok(ControllerCommand {
            position: JointArray::new(control.position),
            velocity: JointArray::new(control.velocity),
            kp: JointArray::new(control.kp),
            kd: JointArray::new(control.kd),
            effort: JointArray::new(control.effort),
        })
    }
}
