// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
use super::*;
use std::any::Any;

trait TestCaseArgument: Any {
    fn parse_into(&mut self, text: &str) -> Result<(), String>;
    fn same(&self, other: &dyn TestCaseArgument) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn debug(&self) -> String;
}

fn test_case_argument_same<T: TestCaseArgument + Sized, SameFn: FnOnce(&T, &T) -> bool>(
    self_: &T,
    other: &dyn TestCaseArgument,
    same_fn: SameFn,
) -> bool {
    if let Some(other) = other.as_any().downcast_ref::<T>() {
        same_fn(self_, other)
    } else {
        false
    }
}

macro_rules! impl_test_case_argument_for_int {
    ($t:ident) => {
        impl TestCaseArgument for $t {
            fn parse_into(&mut self, text: &str) -> Result<(), String> {
                let mut bytes = text.bytes();
                let mut peek = bytes.next();
                let sign = if $t::min_value() != 0 && peek == Some(b'-') {
                    peek = bytes.next();
                    Sign::Negative
                } else {
                    Sign::Positive
                };
                let radix;
                if peek == Some(b'0') {
                    peek = bytes.next();
                    match peek {
                        Some(b'x') | Some(b'X') => {
                            peek = bytes.next();
                            radix = 16;
                        }
                        Some(b'o') | Some(b'O') => {
                            peek = bytes.next();
                            radix = 8;
                        }
                        Some(b'b') | Some(b'B') => {
                            peek = bytes.next();
                            radix = 2;
                        }
                        None => {
                            *self = 0;
                            return Ok(());
                        }
                        _ => return Err("octal numbers must start with 0o".into()),
                    }
                } else {
                    radix = 10;
                };
                if peek == None {
                    return Err("number has no digits".into());
                }
                let mut retval: $t = 0;
                while let Some(digit_char) = peek.take().or_else(|| bytes.next()) {
                    let mut digit = (digit_char as char)
                        .to_digit(radix)
                        .ok_or_else(|| "invalid digit")? as $t;
                    if sign == Sign::Negative {
                        // don't use neg operator since it doesn't exist for unsigned types
                        digit = 0 - digit;
                    }
                    retval = retval
                        .checked_mul(radix as $t)
                        .ok_or_else(|| "number too big")?
                        .checked_add(digit)
                        .ok_or_else(|| "number too big")?;
                }
                *self = retval;
                Ok(())
            }
            fn same(&self, other: &dyn TestCaseArgument) -> bool {
                test_case_argument_same(self, other, PartialEq::eq)
            }
            fn debug(&self) -> String {
                format!("{:#X}", self)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_test_case_argument_for_int!(u8);
impl_test_case_argument_for_int!(u16);
impl_test_case_argument_for_int!(u32);
impl_test_case_argument_for_int!(u64);

impl TestCaseArgument for f64 {
    fn parse_into(&mut self, text: &str) -> Result<(), String> {
        *self = text.parse::<f64>().map_err(|err| err.to_string())?;
        Ok(())
    }
    fn same(&self, other: &dyn TestCaseArgument) -> bool {
        test_case_argument_same(self, other, |a, b| {
            a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
        })
    }
    fn debug(&self) -> String {
        format!("{:?}", self)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

macro_rules! impl_test_case_argument_for_float {
    ($float:ident, $bits:ident) => {
        impl TestCaseArgument for $float {
            fn parse_into(&mut self, text: &str) -> Result<(), String> {
                let mut value: $bits = 0;
                value.parse_into(text)?;
                *self = $float::from_bits(value);
                Ok(())
            }
            fn same(&self, other: &dyn TestCaseArgument) -> bool {
                test_case_argument_same(self, other, |a, b| a.bits() == b.bits())
            }
            fn debug(&self) -> String {
                format!("{:?}", self)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_test_case_argument_for_float!(F16, u16);
impl_test_case_argument_for_float!(F8E4M3Fn, u8);
impl_test_case_argument_for_float!(F8E5M2, u8);
impl_test_case_argument_for_float!(F4E2M1, u8);

macro_rules! impl_test_case_argument_for_enum {
    (enum $type:ident { $($name:ident,)* }) => {
        impl TestCaseArgument for $type {
            fn parse_into(&mut self, text: &str) -> Result<(), String> {
                *self = match text {
                    $(stringify!($name) => $type::$name,)*
                    _ => return Err(concat!("invalid ", stringify!($type)).into()),
                };
                Ok(())
            }
            fn same(&self, other: &dyn TestCaseArgument) -> bool {
                test_case_argument_same(self, other, PartialEq::eq)
            }
            fn debug(&self) -> String {
                format!("{:?}", self)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_test_case_argument_for_enum! {
    enum RoundingMode {
        TiesToEven,
        TowardZero,
        TowardNegative,
        TowardPositive,
        TiesToAway,
        TiesToOdd,
        AwayFromZero,
        StochasticA,
        StochasticB,
        StochasticC,
        TrueStochastic,
        Probabilistic,
    }
}

impl TestCaseArgument for StatusFlags {
    fn parse_into(&mut self, text: &str) -> Result<(), String> {
        if text == "(empty)" {
            *self = StatusFlags::empty();
            return Ok(());
        }
        let mut retval = StatusFlags::empty();
        for word in text.split('|') {
            retval |= match word {
                "INVALID_OPERATION" => StatusFlags::INVALID_OPERATION,
                "DIVISION_BY_ZERO" => StatusFlags::DIVISION_BY_ZERO,
                "OVERFLOW" => StatusFlags::OVERFLOW,
                "UNDERFLOW" => StatusFlags::UNDERFLOW,
                "INEXACT" => StatusFlags::INEXACT,
                _ => return Err("invalid status flags".into()),
            };
        }
        *self = retval;
        Ok(())
    }
    fn same(&self, other: &dyn TestCaseArgument) -> bool {
        test_case_argument_same(self, other, PartialEq::eq)
    }
    fn debug(&self) -> String {
        format!("{:?}", self)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct TestCaseInput<'a> {
    name: &'static str,
    argument: &'a mut dyn TestCaseArgument,
}

struct TestCaseOutput<'a> {
    name: &'static str,
    expected_argument: &'a mut dyn TestCaseArgument,
    output_argument: &'a dyn TestCaseArgument,
}

struct TestCaseIO<'a> {
    inputs: Vec<TestCaseInput<'a>>,
    outputs: Vec<TestCaseOutput<'a>>,
}

#[derive(Copy, Clone)]
struct FileLocation<'a> {
    line: usize,
    file_name: &'a str,
}

impl fmt::Display for FileLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file_name, self.line)
    }
}

trait TestCase {
    fn io(&mut self) -> TestCaseIO<'_>;
    fn calculate(&mut self, location: FileLocation);
    fn parse_and_run(&mut self, test_case: &str, location: FileLocation) {
        let mut arguments_text = test_case.split(' ');
        let io = self.io();
        for argument in io.inputs {
            if let Some(argument_text) = arguments_text.next() {
                if let Err(err) = argument.argument.parse_into(argument_text) {
                    panic!("{}: invalid value for {}: {}", location, argument.name, err);
                } else {
                    println!(
                        "{}: {} = {}",
                        location,
                        argument.name,
                        argument.argument.debug()
                    );
                }
            } else {
                panic!("{}: missing argument: {}", location, argument.name);
            }
        }
        for argument in io.outputs {
            if let Some(argument_text) = arguments_text.next() {
                if let Err(err) = argument.expected_argument.parse_into(argument_text) {
                    panic!("{}: invalid value for {}: {}", location, argument.name, err);
                } else {
                    println!(
                        "{}: expected_{} = {}",
                        location,
                        argument.name,
                        argument.expected_argument.debug()
                    );
                }
            } else {
                panic!("{}: missing argument: {}", location, argument.name);
            }
        }
        if arguments_text.next().is_some() {
            panic!("{}: too many arguments", location);
        }
        self.calculate(location);
        let io = self.io();
        for argument in io.outputs.iter() {
            println!(
                "{}: {} = {}",
                location,
                argument.name,
                argument.output_argument.debug()
            );
        }
        for argument in io.outputs {
            if !argument.expected_argument.same(argument.output_argument) {
                panic!("{}: test case failed", location);
            }
        }
    }
}

fn execute_test_cases<T: TestCase + Default>(test_cases: &str, file_name: &str) {
    for (i, test_case) in test_cases.lines().enumerate() {
        if test_case.starts_with('#') || test_case.is_empty() {
            continue;
        }
        T::default().parse_and_run(
            test_case,
            FileLocation {
                file_name,
                line: i + 1,
            },
        );
    }
}

macro_rules! test_case {
    (
        #[test_case_file_name = $test_case_file_name:expr]
        $(#[$meta:meta])*
        fn $test_name:ident($($input:ident: $input_type:ty,)+ $(#[output] $output:ident: $output_type:ty,)+) {
            $($body:tt)*
        }
    ) => {
        test_case!{
            #[test_case_file_path = concat!(env!("CARGO_MANIFEST_DIR"), "/test_data/", $test_case_file_name)]
            $(#[$meta])*
            fn $test_name($($input: $input_type,)+ $(#[output] $output: $output_type,)+) {
                $($body)*
            }
        }
    };
    (
        #[test_case_file_path = $test_case_file_path:expr]
        $(#[$meta:meta])*
        fn $test_name:ident($($input:ident: $input_type:ty,)+ $(#[output] $output:ident: $output_type:ty,)+) {
            $($body:tt)*
        }
    ) => {
        #[test]
        fn $test_name() {
            #[derive(Default)]
            struct TestCaseImpl {
                $($input: $input_type,)+
                $($output: ($output_type, $output_type),)+
            }

            impl TestCase for TestCaseImpl {
                fn io(&mut self) -> TestCaseIO {
                    let inputs = vec![
                        $(TestCaseInput {
                            name: stringify!($input),
                            argument: &mut self.$input,
                        }),+
                    ];
                    let outputs = vec![
                        $(TestCaseOutput {
                            name: stringify!($output),
                            expected_argument: &mut self.$output.0,
                            output_argument: &mut self.$output.1,
                        }),+
                    ];
                    TestCaseIO {
                        inputs,
                        outputs,
                    }
                }
                fn calculate(&mut self, location: FileLocation) {
                    $(#[$meta])*
                    fn $test_name($($input: $input_type,)+ $($output: &mut $output_type,)+ location: FileLocation) {
                        let _ = &location;
                        $($body)*
                    }
                    $test_name($(self.$input.clone(),)+ $(&mut self.$output.1,)+ location);
                }
            }
            execute_test_cases::<TestCaseImpl>(include_str!($test_case_file_path), $test_case_file_path);
        }
    };
}

fn from_f64_test_case<FT: FloatTraits + Default>(
    value: f64,
    rounding_mode: RoundingMode,
    result: &mut Float<FT>,
    status_flags: &mut StatusFlags,
) {
    let mut fp_state = FPState::default();
    *result = Float::from_f64(value, Some(rounding_mode), Some(&mut fp_state));
    *status_flags = fp_state.flags();
}

test_case! {
    #[test_case_file_name = "from_f64_e4m3fn.txt"]
    fn test_from_f64_e4m3fn(
        value: f64,
        rounding_mode: RoundingMode,
        #[output] result: F8E4M3Fn,
        #[output] status_flags: StatusFlags,
    ) {
        from_f64_test_case(value, rounding_mode, result, status_flags);
    }
}

test_case! {
    #[test_case_file_name = "from_f64_e5m2.txt"]
    fn test_from_f64_e5m2(
        value: f64,
        rounding_mode: RoundingMode,
        #[output] result: F8E5M2,
        #[output] status_flags: StatusFlags,
    ) {
        from_f64_test_case(value, rounding_mode, result, status_flags);
    }
}

test_case! {
    #[test_case_file_name = "from_f64_e2m1.txt"]
    fn test_from_f64_e2m1(
        value: f64,
        rounding_mode: RoundingMode,
        #[output] result: F4E2M1,
        #[output] status_flags: StatusFlags,
    ) {
        from_f64_test_case(value, rounding_mode, result, status_flags);
    }
}

test_case! {
    #[test_case_file_name = "f16_to_e4m3fn.txt"]
    fn test_f16_to_e4m3fn(
        value: F16,
        rounding_mode: RoundingMode,
        #[output] result: F8E4M3Fn,
        #[output] status_flags: StatusFlags,
    ) {
        let mut fp_state = FPState::default();
        *result = F8E4M3Fn::convert_from_float(&value, Some(rounding_mode), Some(&mut fp_state));
        *status_flags = fp_state.flags();
    }
}

test_case! {
    #[test_case_file_name = "e4m3fn_add.txt"]
    fn test_e4m3fn_add(
        lhs: F8E4M3Fn,
        rhs: F8E4M3Fn,
        rounding_mode: RoundingMode,
        #[output] result: F8E4M3Fn,
        #[output] status_flags: StatusFlags,
    ) {
        let mut fp_state = FPState::default();
        *result = lhs.add(&rhs, Some(rounding_mode), Some(&mut fp_state));
        *status_flags = fp_state.flags();
    }
}

test_case! {
    #[test_case_file_name = "e4m3fn_mul.txt"]
    fn test_e4m3fn_mul(
        lhs: F8E4M3Fn,
        rhs: F8E4M3Fn,
        rounding_mode: RoundingMode,
        #[output] result: F8E4M3Fn,
        #[output] status_flags: StatusFlags,
    ) {
        let mut fp_state = FPState::default();
        *result = lhs.mul(&rhs, Some(rounding_mode), Some(&mut fp_state));
        *status_flags = fp_state.flags();
    }
}
