//! 等式判定
//!
//! 给定一段连续字符，判断它是否构成某个玩家的获胜等式：
//! 长度足够、恰好一个 `=`、只含该玩家的变量、至少一个运算符，
//! 两侧都能解析为算术表达式，且关于该变量恰好有一个整数解。
//! 重根只算一个解，`x*x=0` 的解是 0。
//!
//! 相邻的两个操作数之间视为乘法：`2x` 即 `2*x`，`x2` 即 `x*2`。
//! 计算全部使用精确有理数，溢出时视为不是等式。

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, One, Zero};

use crate::constants::MIN_EQ_LEN;
use crate::tile::{Operator, Tile, Variable};

/// 判定结果，未获胜时给出停在哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 获胜，附带唯一整数解
    Winning(i64),
    /// 长度不足
    TooShort,
    /// `=` 数量不是 1
    EqualsCount(usize),
    /// 不含玩家变量
    MissingVariable,
    /// 含有对手变量
    OpponentVariable,
    /// 没有运算符
    NoOperator,
    /// 表达式无法解析
    Malformed,
    /// 无解
    NoSolution,
    /// 无穷多解
    InfiniteSolutions,
    /// 唯一解但不是整数
    NonInteger(Rational),
    /// 多个不同的解（含复数解）
    MultipleSolutions,
}

impl Verdict {
    pub fn is_winning(&self) -> bool {
        matches!(self, Verdict::Winning(_))
    }
}

/// 是否是 `player` 的获胜等式
pub fn is_winning_equation(sequence: &[Tile], player: Variable) -> bool {
    classify(sequence, player).is_winning()
}

/// 获胜时返回整数解
pub fn evaluate(sequence: &[Tile], player: Variable) -> Option<i64> {
    match classify(sequence, player) {
        Verdict::Winning(value) => Some(value),
        _ => None,
    }
}

/// 把字符串转为字符序列，含字母表之外的字符时返回 None
pub fn parse_tiles(text: &str) -> Option<Vec<Tile>> {
    text.chars().map(Tile::from_char).collect()
}

/// 按顺序逐步检查，遇到第一处不满足即返回
pub fn classify(sequence: &[Tile], player: Variable) -> Verdict {
    if sequence.len() < MIN_EQ_LEN {
        return Verdict::TooShort;
    }

    let equals = sequence.iter().filter(|t| **t == Tile::Equals).count();
    if equals != 1 {
        return Verdict::EqualsCount(equals);
    }

    let own = Tile::Variable(player);
    let opponent = Tile::Variable(player.opponent());
    if !sequence.contains(&own) {
        return Verdict::MissingVariable;
    }
    if sequence.contains(&opponent) {
        return Verdict::OpponentVariable;
    }

    let Some(split) = sequence.iter().position(|t| *t == Tile::Equals) else {
        return Verdict::EqualsCount(0);
    };
    let (Some(left), Some(right)) = (
        tokenize(&sequence[..split]),
        tokenize(&sequence[split + 1..]),
    ) else {
        return Verdict::Malformed;
    };

    let has_operator = left
        .iter()
        .chain(right.iter())
        .any(|t| matches!(t, Token::Op(_)));
    if !has_operator {
        return Verdict::NoOperator;
    }

    let (Some(lhs), Some(rhs)) = (Parser::parse(&left), Parser::parse(&right)) else {
        return Verdict::Malformed;
    };

    match solve(&lhs, &rhs) {
        Some(Solution::Unique(root)) => match to_i64(&root) {
            Some(value) => Verdict::Winning(value),
            None => Verdict::NonInteger(root),
        },
        Some(Solution::None) => Verdict::NoSolution,
        Some(Solution::Infinite) => Verdict::InfiniteSolutions,
        Some(Solution::Multiple) => Verdict::MultipleSolutions,
        // 中间结果溢出
        None => Verdict::Malformed,
    }
}

// ============================================================================
// 词法与语法分析
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Num(i128),
    Var,
    Op(Operator),
}

impl Token {
    fn is_operand(&self) -> bool {
        matches!(self, Token::Num(_) | Token::Var)
    }
}

/// 合并连续数字，并在相邻操作数之间补乘号
fn tokenize(tiles: &[Tile]) -> Option<Vec<Token>> {
    fn push(tokens: &mut Vec<Token>, token: Token) {
        if token.is_operand() && tokens.last().is_some_and(Token::is_operand) {
            tokens.push(Token::Op(Operator::Mul));
        }
        tokens.push(token);
    }

    let mut tokens: Vec<Token> = Vec::with_capacity(tiles.len());
    let mut number: Option<i128> = None;

    for tile in tiles {
        match tile {
            Tile::Digit(d) => {
                let acc = number.unwrap_or(0);
                number = Some(acc.checked_mul(10)?.checked_add(*d as i128)?);
            }
            Tile::Variable(_) => {
                if let Some(n) = number.take() {
                    push(&mut tokens, Token::Num(n));
                }
                push(&mut tokens, Token::Var);
            }
            Tile::Operator(op) => {
                if let Some(n) = number.take() {
                    push(&mut tokens, Token::Num(n));
                }
                push(&mut tokens, Token::Op(*op));
            }
            // 调用方已按 `=` 切分
            Tile::Equals => return None,
        }
    }
    if let Some(n) = number.take() {
        push(&mut tokens, Token::Num(n));
    }
    Some(tokens)
}

/// 递归下降解析器
///
/// ```text
/// expr  := term (('+' | '-') term)*
/// term  := unary (('*' | '/') unary)*
/// unary := ('+' | '-') unary | NUM | VAR
/// ```
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse(tokens: &'a [Token]) -> Option<Fraction> {
        if tokens.is_empty() {
            return None;
        }
        let mut parser = Parser { tokens, pos: 0 };
        let value = parser.expr()?;
        if parser.pos != tokens.len() {
            return None;
        }
        Some(value)
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn expr(&mut self) -> Option<Fraction> {
        let mut acc = self.term()?;
        while let Some(Token::Op(op @ (Operator::Add | Operator::Sub))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = match op {
                Operator::Add => acc.add(&rhs)?,
                _ => acc.sub(&rhs)?,
            };
        }
        Some(acc)
    }

    fn term(&mut self) -> Option<Fraction> {
        let mut acc = self.unary()?;
        while let Some(Token::Op(op @ (Operator::Mul | Operator::Div))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = match op {
                Operator::Mul => acc.mul(&rhs)?,
                _ => acc.div(&rhs)?,
            };
        }
        Some(acc)
    }

    fn unary(&mut self) -> Option<Fraction> {
        let token = self.peek()?;
        self.pos += 1;
        match token {
            Token::Op(Operator::Add) => self.unary(),
            Token::Op(Operator::Sub) => self.unary()?.neg(),
            Token::Op(_) => None,
            Token::Num(n) => Some(Fraction::from_poly(Poly::constant(Rational::from_integer(n)))),
            Token::Var => Some(Fraction::from_poly(Poly::variable())),
        }
    }
}

// ============================================================================
// 求解
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Solution {
    Unique(Rational),
    None,
    Infinite,
    Multiple,
}

/// 求解 lhs = rhs
///
/// 去分母后取无平方因式，每个不同的根只出现一次；
/// 再约去与分母的公因式，这些根会使分母为零。剩下的次数就是不同解的个数。
fn solve(lhs: &Fraction, rhs: &Fraction) -> Option<Solution> {
    let p = lhs.num.mul(&rhs.den)?.sub(&rhs.num.mul(&lhs.den)?)?;
    if p.is_zero() {
        return Some(Solution::Infinite);
    }

    let denominators = lhs.den.mul(&rhs.den)?;
    let distinct = p.square_free()?;
    let common = distinct.gcd(&denominators)?;
    let (reduced, _) = distinct.div_rem(&common)?;

    match reduced.degree() {
        Some(0) => Some(Solution::None),
        Some(1) => {
            let root = neg(&reduced.coeff(0))?.checked_div(&reduced.coeff(1))?;
            if denominators.eval(root)?.is_zero() {
                Some(Solution::None)
            } else {
                Some(Solution::Unique(root))
            }
        }
        _ => Some(Solution::Multiple),
    }
}

/// 多项式之比，分母在解析中只会累积不会约分
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fraction {
    num: Poly,
    den: Poly,
}

impl Fraction {
    fn from_poly(num: Poly) -> Self {
        Self {
            num,
            den: Poly::constant(Rational::one()),
        }
    }

    fn add(&self, other: &Fraction) -> Option<Fraction> {
        Some(Fraction {
            num: self.num.mul(&other.den)?.add(&other.num.mul(&self.den)?)?,
            den: self.den.mul(&other.den)?,
        })
    }

    fn sub(&self, other: &Fraction) -> Option<Fraction> {
        self.add(&other.neg()?)
    }

    fn mul(&self, other: &Fraction) -> Option<Fraction> {
        Some(Fraction {
            num: self.num.mul(&other.num)?,
            den: self.den.mul(&other.den)?,
        })
    }

    fn div(&self, other: &Fraction) -> Option<Fraction> {
        // 除以常数 0
        if other.num.is_zero() {
            return None;
        }
        Some(Fraction {
            num: self.num.mul(&other.den)?,
            den: self.den.mul(&other.num)?,
        })
    }

    fn neg(&self) -> Option<Fraction> {
        Some(Fraction {
            num: self.num.neg()?,
            den: self.den.clone(),
        })
    }
}

/// 有理系数多项式，`coeffs[i]` 为 i 次项系数，末尾无零
#[derive(Debug, Clone, PartialEq, Eq)]
struct Poly {
    coeffs: Vec<Rational>,
}

impl Poly {
    fn from_coeffs(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().is_some_and(Rational::is_zero) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    fn constant(value: Rational) -> Self {
        Self::from_coeffs(vec![value])
    }

    fn variable() -> Self {
        Self::from_coeffs(vec![Rational::zero(), Rational::one()])
    }

    fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    fn coeff(&self, power: usize) -> Rational {
        self.coeffs.get(power).copied().unwrap_or_else(Rational::zero)
    }

    fn lead(&self) -> Rational {
        self.coeffs.last().copied().unwrap_or_else(Rational::zero)
    }

    fn add(&self, other: &Poly) -> Option<Poly> {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| self.coeff(i).checked_add(&other.coeff(i)))
            .collect::<Option<Vec<_>>>()?;
        Some(Poly::from_coeffs(coeffs))
    }

    fn sub(&self, other: &Poly) -> Option<Poly> {
        self.add(&other.neg()?)
    }

    fn neg(&self) -> Option<Poly> {
        let coeffs = self
            .coeffs
            .iter()
            .map(neg)
            .collect::<Option<Vec<_>>>()?;
        Some(Poly::from_coeffs(coeffs))
    }

    fn mul(&self, other: &Poly) -> Option<Poly> {
        if self.is_zero() || other.is_zero() {
            return Some(Poly::from_coeffs(Vec::new()));
        }
        let mut coeffs = vec![Rational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] = coeffs[i + j].checked_add(&a.checked_mul(b)?)?;
            }
        }
        Some(Poly::from_coeffs(coeffs))
    }

    fn scale(&self, factor: Rational) -> Option<Poly> {
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| c.checked_mul(&factor))
            .collect::<Option<Vec<_>>>()?;
        Some(Poly::from_coeffs(coeffs))
    }

    fn eval(&self, x: Rational) -> Option<Rational> {
        self.coeffs
            .iter()
            .rev()
            .try_fold(Rational::zero(), |acc, c| acc.checked_mul(&x)?.checked_add(c))
    }

    /// 形式导数
    fn derivative(&self) -> Option<Poly> {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, c)| c.checked_mul(&Rational::from_integer(power as i128)))
            .collect::<Option<Vec<_>>>()?;
        Some(Poly::from_coeffs(coeffs))
    }

    /// 去掉重因式：p / gcd(p, p')
    fn square_free(&self) -> Option<Poly> {
        let repeated = self.gcd(&self.derivative()?)?;
        let (quotient, _) = self.div_rem(&repeated)?;
        Some(quotient)
    }

    /// 多项式带余除法，除数不能为零
    fn div_rem(&self, divisor: &Poly) -> Option<(Poly, Poly)> {
        let divisor_degree = divisor.degree()?;
        let mut remainder = self.clone();
        let mut quotient =
            vec![Rational::zero(); self.coeffs.len().saturating_sub(divisor_degree)];

        while let Some(degree) = remainder.degree() {
            if degree < divisor_degree {
                break;
            }
            let shift = degree - divisor_degree;
            let factor = remainder.lead().checked_div(&divisor.lead())?;
            quotient[shift] = factor;

            let mut shifted = vec![Rational::zero(); shift];
            shifted.extend(divisor.scale(factor)?.coeffs);
            remainder = remainder.sub(&Poly::from_coeffs(shifted))?;
            // 首项必须被消去
            if remainder.degree().is_some_and(|d| d >= degree) {
                return None;
            }
        }
        Some((Poly::from_coeffs(quotient), remainder))
    }

    /// 首一最大公因式
    fn gcd(&self, other: &Poly) -> Option<Poly> {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let (_, r) = a.div_rem(&b)?;
            a = b;
            b = r;
        }
        if a.is_zero() {
            return Some(Poly::constant(Rational::one()));
        }
        let lead = a.lead();
        a.scale(Rational::one().checked_div(&lead)?)
    }
}

// ============================================================================
// 有理数
// ============================================================================

/// 精确有理数，分母恒为正
pub type Rational = Ratio<i128>;

fn neg(value: &Rational) -> Option<Rational> {
    value.checked_mul(&Rational::from_integer(-1))
}

/// 整数且在 i64 范围内时返回其值
fn to_i64(value: &Rational) -> Option<i64> {
    if value.is_integer() {
        i64::try_from(*value.numer()).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(text: &str, player: Variable) -> Verdict {
        classify(&parse_tiles(text).unwrap(), player)
    }

    fn solve_text(text: &str) -> Option<Solution> {
        let tiles = parse_tiles(text).unwrap();
        let split = tiles.iter().position(|t| *t == Tile::Equals).unwrap();
        let lhs = Parser::parse(&tokenize(&tiles[..split]).unwrap()).unwrap();
        let rhs = Parser::parse(&tokenize(&tiles[split + 1..]).unwrap()).unwrap();
        solve(&lhs, &rhs)
    }

    #[test]
    fn test_simple_win() {
        assert_eq!(verdict("x+2=7", Variable::X), Verdict::Winning(5));
        assert!(is_winning_equation(&parse_tiles("x+2=7").unwrap(), Variable::X));
        assert_eq!(evaluate(&parse_tiles("y*3=12").unwrap(), Variable::Y), Some(4));
    }

    #[test]
    fn test_opponent_variable_rejected_before_solving() {
        assert_eq!(verdict("x+y=7", Variable::X), Verdict::OpponentVariable);
        assert_eq!(verdict("x+y=7", Variable::Y), Verdict::OpponentVariable);
    }

    #[test]
    fn test_non_integer_solution() {
        assert_eq!(
            solve_text("2x=7"),
            Some(Solution::Unique(Rational::new(7, 2)))
        );
        assert_eq!(
            verdict("2x+0=7", Variable::X),
            Verdict::NonInteger(Rational::new(7, 2))
        );
    }

    #[test]
    fn test_identity_has_infinite_solutions() {
        assert_eq!(solve_text("x=x"), Some(Solution::Infinite));
        assert_eq!(verdict("x+1=1+x", Variable::X), Verdict::InfiniteSolutions);
        assert_eq!(verdict("2*x=x+x", Variable::X), Verdict::InfiniteSolutions);
    }

    #[test]
    fn test_structural_checks_in_order() {
        assert_eq!(verdict("x+1=", Variable::X), Verdict::TooShort);
        assert_eq!(verdict("x+1=2=3", Variable::X), Verdict::EqualsCount(2));
        assert_eq!(verdict("x+1+23", Variable::X), Verdict::EqualsCount(0));
        assert_eq!(verdict("3+1=4", Variable::X), Verdict::MissingVariable);
        assert_eq!(verdict("x+1=4", Variable::Y), Verdict::MissingVariable);
        assert_eq!(verdict("x=123", Variable::X), Verdict::NoOperator);
    }

    #[test]
    fn test_implied_multiplication_counts_as_operator() {
        assert_eq!(verdict("2x=18", Variable::X), Verdict::Winning(9));
        assert_eq!(verdict("x3=21", Variable::X), Verdict::Winning(7));
        assert_eq!(verdict("12=4x", Variable::X), Verdict::Winning(3));
    }

    #[test]
    fn test_precedence_and_unary_sign() {
        assert_eq!(verdict("2+3x=14", Variable::X), Verdict::Winning(4));
        assert_eq!(verdict("x-10/5=1", Variable::X), Verdict::Winning(3));
        assert_eq!(verdict("-x+4=9", Variable::X), Verdict::Winning(-5));
        assert_eq!(verdict("x*-2=8", Variable::X), Verdict::Winning(-4));
        assert_eq!(verdict("x--3=5", Variable::X), Verdict::Winning(2));
    }

    #[test]
    fn test_malformed_sides() {
        assert_eq!(verdict("=x+35", Variable::X), Verdict::Malformed);
        assert_eq!(verdict("x+35=", Variable::X), Verdict::Malformed);
        assert_eq!(verdict("x**2=4", Variable::X), Verdict::Malformed);
        assert_eq!(verdict("x+2*=7", Variable::X), Verdict::Malformed);
        assert_eq!(verdict("x/0=17", Variable::X), Verdict::Malformed);
    }

    #[test]
    fn test_no_solution() {
        assert_eq!(verdict("x+1=x+2", Variable::X), Verdict::NoSolution);
        // x = 0 会使分母为零
        assert_eq!(verdict("x*x/x=0", Variable::X), Verdict::NoSolution);
    }

    #[test]
    fn test_division_by_variable() {
        assert_eq!(verdict("6/x=2", Variable::X), Verdict::Winning(3));
        assert_eq!(verdict("x/x=1+0", Variable::X), Verdict::InfiniteSolutions);
        // 3/x*0 约去后只剩 x = 2
        assert_eq!(verdict("3/x*0+x=2", Variable::X), Verdict::Winning(2));
    }

    #[test]
    fn test_distinct_roots_are_not_winning() {
        assert_eq!(verdict("x*x=4", Variable::X), Verdict::MultipleSolutions);
        assert_eq!(verdict("xx-9=0", Variable::X), Verdict::MultipleSolutions);
        assert_eq!(solve_text("x*x*x=8"), Some(Solution::Multiple));
    }

    #[test]
    fn test_repeated_root_counts_once() {
        assert_eq!(verdict("x*x=0", Variable::X), Verdict::Winning(0));
        // (x-3)^2
        assert_eq!(verdict("x*x+9=6x", Variable::X), Verdict::Winning(3));
        // (x-2)^2
        assert_eq!(verdict("x*x-4x=0-4", Variable::X), Verdict::Winning(2));
        // (2x-1)^2 的重根不是整数
        assert_eq!(
            verdict("4xx+1=4x", Variable::X),
            Verdict::NonInteger(Rational::new(1, 2))
        );
    }

    #[test]
    fn test_repeated_root_on_denominator_zero() {
        // x*x/x 的唯一候选 0 使分母为零
        assert_eq!(verdict("x*x*x/x=0", Variable::X), Verdict::NoSolution);
        // x*x*(x-1)/x 约去 x 后剩 x = 1
        assert_eq!(verdict("xx*x/x-x=0", Variable::X), Verdict::Winning(1));
    }

    #[test]
    fn test_reversal_is_evaluated_independently() {
        let forward = parse_tiles("7=2+x").unwrap();
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(classify(&forward, Variable::X), Verdict::Winning(5));
        // "x+2=7"
        assert_eq!(classify(&reversed, Variable::X), Verdict::Winning(5));

        let forward = parse_tiles("x-12=3").unwrap();
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(classify(&forward, Variable::X), Verdict::Winning(15));
        // "3=21-x"
        assert_eq!(classify(&reversed, Variable::X), Verdict::Winning(18));
    }

    #[test]
    fn test_deterministic() {
        let tiles = parse_tiles("x+2=7").unwrap();
        let first = classify(&tiles, Variable::X);
        for _ in 0..10 {
            assert_eq!(classify(&tiles, Variable::X), first);
        }
    }

    #[test]
    fn test_overflow_is_not_an_error() {
        let huge = "x*999999999999999999999=1";
        assert!(!verdict(huge, Variable::X).is_winning());
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(to_i64(&Rational::new(4, 2)), Some(2));
        assert_eq!(to_i64(&Rational::new(6, -4)), None);
        assert_eq!(to_i64(&Rational::from_integer(i128::from(i64::MAX) + 1)), None);
        assert_eq!(neg(&Rational::new(6, -4)), Some(Rational::new(3, 2)));
    }
}
